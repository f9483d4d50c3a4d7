//! Persistence contracts.
//!
//! Stores are constructed once at startup and passed down as explicit
//! handles; nothing in the service layer reaches for process-global state.
//! Postgres implementations live in [`crate::db`]; the integration-test
//! harness substitutes in-memory ones.

use async_trait::async_trait;

use orchard_core::{Email, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::cart::Cart;
use crate::models::product::{NewProduct, Product};
use crate::models::user::User;

/// Access to user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look a user up by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Create a user.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Fetch a user together with their stored password hash.
    async fn find_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Access to the product catalog.
///
/// Cart operations never mutate stock; writes exist for catalog management
/// and seeding only.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch one product.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Batch fetch for view assembly; missing ids are simply absent from
    /// the result.
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// List the catalog, optionally restricted to an exact category match.
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError>;

    /// Insert one product.
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Replace the whole catalog in one transaction. Returns the inserted
    /// count.
    async fn replace_all(&self, products: Vec<NewProduct>) -> Result<usize, RepositoryError>;
}

/// Durable per-user cart state.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load a user's cart. `None` if the user has never added anything.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Replace the cart's entire line collection in one durable operation.
    ///
    /// Implementations must enforce one cart per user at the storage layer:
    /// concurrent first adds for the same user have to converge on a single
    /// cart record rather than creating two.
    async fn upsert(&self, cart: &Cart) -> Result<(), RepositoryError>;
}
