//! Read-only product availability lookup.
//!
//! Consulted immediately before every mutating cart operation. An optional
//! bounded-TTL cache widens the staleness window when enabled; it is off
//! unless configured. The lookup is treated as a fallible remote call and
//! bounded by a deadline.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use thiserror::Error;

use orchard_core::ProductId;

use crate::db::RepositoryError;
use crate::store::ProductStore;

/// Price and sellable stock for one product.
///
/// A product with zero stock is still a present product; absence from the
/// catalog is reported separately as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub price: Decimal,
    pub stock: i32,
}

/// Errors from availability lookup.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The lookup did not answer within the configured deadline.
    #[error("inventory lookup timed out")]
    Unavailable,

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Read-only accessor over the product catalog.
pub struct Inventory {
    products: Arc<dyn ProductStore>,
    cache: Option<Cache<ProductId, Availability>>,
    timeout: Duration,
}

impl Inventory {
    /// Create an inventory accessor.
    ///
    /// `cache_ttl` of `None` disables caching; every lookup then reads the
    /// store directly.
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        cache_ttl: Option<Duration>,
        timeout: Duration,
    ) -> Self {
        let cache = cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build()
        });

        Self {
            products,
            cache,
            timeout,
        }
    }

    /// Price and stock for `product_id`, or `None` for an unknown product.
    ///
    /// Only present products are cached; a product that just entered the
    /// catalog becomes visible on the next lookup.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Unavailable`] when the store does not answer within
    /// the deadline; store failures pass through.
    pub async fn availability(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Availability>, InventoryError> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&product_id).await
        {
            return Ok(Some(hit));
        }

        let lookup = self.products.find_by_id(product_id);
        let product = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| InventoryError::Unavailable)??;

        let availability = product.map(|p| Availability {
            price: p.price,
            stock: p.stock,
        });

        if let (Some(cache), Some(availability)) = (&self.cache, availability) {
            cache.insert(product_id, availability).await;
        }

        Ok(availability)
    }
}
