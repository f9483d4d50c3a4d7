//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::cart::CartService;
use crate::services::inventory::Inventory;
use crate::services::token::TokenService;
use crate::store::{CartStore, ProductStore, UserStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Stores are explicit handles constructed at
/// startup and passed down; there is no process-global connection.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    tokens: Arc<TokenService>,
    cart: CartService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Build state over the given stores.
    ///
    /// `pool` feeds the readiness probe only; test setups pass `None` and
    /// wire in non-Postgres stores.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
        pool: Option<PgPool>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            &config.token_secret,
            config.token_ttl_days,
        ));
        let inventory = Inventory::new(
            Arc::clone(&products),
            config.inventory_cache_ttl,
            config.inventory_timeout,
        );
        let cart = CartService::new(carts, Arc::clone(&products), inventory);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                products,
                tokens,
                cart,
                pool,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a handle to the user store.
    #[must_use]
    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.inner.users)
    }

    /// Get a handle to the product store.
    #[must_use]
    pub fn products(&self) -> Arc<dyn ProductStore> {
        Arc::clone(&self.inner.products)
    }

    /// Get a handle to the token service.
    #[must_use]
    pub fn tokens(&self) -> Arc<TokenService> {
        Arc::clone(&self.inner.tokens)
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the database pool, when one is attached.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
