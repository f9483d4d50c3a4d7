//! Integration test support for Orchard.
//!
//! Builds the real router over in-memory store implementations so the HTTP
//! contract can be exercised hermetically — no database, no network.
//!
//! ```rust,ignore
//! let ctx = TestContext::new();
//! let response = ctx.router.clone().oneshot(request).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use secrecy::SecretString;

use orchard_core::{Email, ProductId, UserId};
use orchard_server::config::ServerConfig;
use orchard_server::db::RepositoryError;
use orchard_server::models::cart::Cart;
use orchard_server::models::product::{NewProduct, Product};
use orchard_server::models::user::User;
use orchard_server::routes;
use orchard_server::state::AppState;
use orchard_server::store::{CartStore, ProductStore, UserStore};

/// Server configuration with no external dependencies.
fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/orchard_test"),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        token_secret: SecretString::from("kY7#mQ2$vX9@nL4!pR8&wZ3*uB6^eD1%"),
        token_ttl_days: 30,
        inventory_cache_ttl: None,
        inventory_timeout: Duration::from_secs(5),
        seed_source_url: "https://dummyjson.com/products".to_owned(),
        sentry_dsn: None,
    }
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    next_id: AtomicI32,
    users: Mutex<HashMap<i32, (User, String)>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|(user, _)| user.email == *email)
            .map(|(user, _)| user.clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .get(&id.as_i32())
            .map(|(user, _)| user.clone()))
    }

    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock();
        if users.values().any(|(user, _)| user.email == *email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(id),
            name: name.to_owned(),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, (user.clone(), password_hash.to_owned()));

        Ok(user)
    }

    async fn find_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|(user, _)| user.email == *email)
            .cloned())
    }
}

/// In-memory [`ProductStore`].
#[derive(Default)]
pub struct MemoryProductStore {
    next_id: AtomicI32,
    products: Mutex<HashMap<i32, Product>>,
}

impl MemoryProductStore {
    /// Seed one product directly, bypassing the API.
    pub fn seed(&self, title: &str, price_cents: i64, stock: i32) -> Product {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(id),
            title: title.to_owned(),
            description: format!("{title} description"),
            price: Decimal::new(price_cents, 2),
            discount_percentage: None,
            rating: None,
            stock,
            brand: None,
            category: Some("test".to_owned()),
            thumbnail: None,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.products.lock().insert(id, product.clone());
        product
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().get(&id.as_i32()).cloned())
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.lock();
        Ok(ids
            .iter()
            .filter_map(|id| products.get(&id.as_i32()).cloned())
            .collect())
    }

    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.lock();
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| category.is_none_or(|c| p.category.as_deref() == Some(c)))
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.id.as_i32());
        Ok(matching)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(id),
            title: product.title,
            description: product.description,
            price: product.price,
            discount_percentage: product.discount_percentage,
            rating: product.rating,
            stock: product.stock,
            brand: product.brand,
            category: product.category,
            thumbnail: product.thumbnail,
            images: product.images,
            created_at: now,
            updated_at: now,
        };
        self.products.lock().insert(id, created.clone());
        Ok(created)
    }

    async fn replace_all(&self, products: Vec<NewProduct>) -> Result<usize, RepositoryError> {
        let mut inserted = 0_usize;
        self.products.lock().clear();
        for product in products {
            self.create(product).await?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

/// In-memory [`CartStore`].
#[derive(Default)]
pub struct MemoryCartStore {
    carts: Mutex<HashMap<UserId, Cart>>,
}

impl MemoryCartStore {
    /// Number of stored cart records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.carts.lock().len()
    }

    /// Snapshot of a user's stored cart.
    #[must_use]
    pub fn stored(&self, user_id: UserId) -> Option<Cart> {
        self.carts.lock().get(&user_id).cloned()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.lock().get(&user_id).cloned())
    }

    async fn upsert(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.carts.lock().insert(cart.user_id, cart.clone());
        Ok(())
    }
}

/// The real router wired over in-memory stores, plus handles to inspect
/// them from tests.
pub struct TestContext {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub products: Arc<MemoryProductStore>,
    pub carts: Arc<MemoryCartStore>,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let products = Arc::new(MemoryProductStore::default());
        let carts = Arc::new(MemoryCartStore::default());

        let state = AppState::new(
            test_config(),
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&products) as Arc<dyn ProductStore>,
            Arc::clone(&carts) as Arc<dyn CartStore>,
            None,
        );
        let router = routes::routes().with_state(state);

        Self {
            router,
            users,
            products,
            carts,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Build a JSON request, optionally with a bearer token.
///
/// # Panics
///
/// Panics if the request cannot be built; test-only code.
#[must_use]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .expect("request"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("request"),
    }
}

/// Drive one request through the router and decode the JSON response.
///
/// # Panics
///
/// Panics if the router fails or the body is not valid JSON; test-only code.
pub async fn send(
    router: &Router,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();

    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, body)
}
