//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orchard_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::product::{NewProduct, Product};
use crate::services::catalog::{self, SeedReport};
use crate::state::AppState;

/// Catalog listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Exact category match; no other filtering is supported.
    pub category: Option<String>,
}

/// Catalog listing response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub count: usize,
    pub products: Vec<Product>,
}

/// List the catalog, optionally restricted to one category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductList>> {
    let products = state.products().list(query.category.as_deref()).await?;

    Ok(Json(ProductList {
        count: products.len(),
        products,
    }))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    let product = state
        .products()
        .find_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(product))
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.products().create(body).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace the catalog with sample products from the seed feed.
#[instrument(skip(state))]
pub async fn seed(State(state): State<AppState>) -> Result<(StatusCode, Json<SeedReport>)> {
    let products = state.products();
    let report = catalog::seed_catalog(products.as_ref(), &state.config().seed_source_url).await?;

    Ok((StatusCode::CREATED, Json(report)))
}
