//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness (wired in main)
//! GET  /health/ready           - Readiness (wired in main)
//!
//! # Auth
//! POST /auth/register          - Create an account, returns a bearer token
//! POST /auth/login             - Exchange credentials for a bearer token
//!
//! # Products
//! GET  /products               - Catalog listing (?category= exact match)
//! GET  /products/{id}          - Product detail
//! POST /products               - Create a product
//! POST /products/seed          - Replace the catalog from the sample feed
//!
//! # Cart (requires Authorization: Bearer)
//! GET    /cart                 - Current user's cart
//! POST   /cart                 - Add an item
//! PUT    /cart/{item_id}       - Set an item's quantity
//! DELETE /cart/{item_id}       - Remove an item
//! ```

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/seed", post(products::seed))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{item_id}", put(cart::update).delete(cart::remove))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}
