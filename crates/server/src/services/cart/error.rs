//! Cart operation error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from cart operations.
///
/// Everything except `Store` is client-recoverable and maps to a 4xx (or,
/// for an unavailable inventory lookup, a 502) with a stable kind.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity below one.
    #[error("quantity must be at least 1")]
    NonPositiveQuantity,

    /// The referenced product is not in the catalog. Distinct from a
    /// product that is present with zero stock.
    #[error("product not found")]
    ProductNotFound,

    /// The user has no stored cart.
    #[error("cart not found")]
    CartNotFound,

    /// No line with the given id in the user's cart.
    #[error("item not found in cart")]
    ItemNotFound,

    /// Requested quantity exceeds available stock.
    #[error("not enough stock available")]
    InsufficientStock,

    /// The inventory lookup did not answer in time.
    #[error("inventory lookup unavailable")]
    InventoryUnavailable,

    /// Store failure.
    #[error("database error: {0}")]
    Store(#[from] RepositoryError),
}
