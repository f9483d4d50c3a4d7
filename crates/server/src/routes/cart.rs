//! Cart route handlers.
//!
//! Every handler runs behind the credential gate ([`RequireAuth`]); an
//! unauthenticated request is rejected before any store access.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use orchard_core::{CartItemId, ProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::cart::CartView;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Current user's cart; an empty view when nothing was ever added.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = state.cart().get_cart(user.id).await?;

    Ok(Json(cart))
}

/// Add a product to the cart, merging into an existing line.
///
/// Returns 201 when this stored the user's first-ever cart record.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let outcome = state
        .cart()
        .add_item(user.id, ProductId::new(body.product_id), body.quantity)
        .await?;

    let status = if outcome.created_cart {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.cart)))
}

/// Set a line's quantity (absolute, not a delta).
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = state
        .cart()
        .update_item(user.id, item_id, body.quantity)
        .await?;

    Ok(Json(cart))
}

/// Remove a line. The cart record survives even when emptied.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    let cart = state.cart().remove_item(user.id, item_id).await?;

    Ok(Json(cart))
}
