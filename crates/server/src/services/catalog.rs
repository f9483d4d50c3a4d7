//! Catalog seeding from the DummyJSON sample feed.
//!
//! Fetches the feed, maps it onto catalog rows, and replaces the stored
//! catalog in one transaction. Exposed over HTTP as `POST /products/seed`
//! and from the CLI as `orchard-cli seed`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::product::NewProduct;
use crate::store::ProductStore;

/// Errors from catalog seeding.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The seed feed could not be fetched or parsed.
    #[error("seed source request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Store failure while replacing the catalog.
    #[error("database error: {0}")]
    Store(#[from] RepositoryError),
}

/// One product entry in the seed feed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedProduct {
    title: String,
    description: String,
    price: Decimal,
    #[serde(default)]
    discount_percentage: Option<Decimal>,
    #[serde(default)]
    rating: Option<Decimal>,
    stock: i32,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

/// Top-level shape of the seed feed.
#[derive(Debug, Deserialize)]
struct SeedFeed {
    products: Vec<SeedProduct>,
}

/// Summary of a completed seed run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeedReport {
    pub fetched: usize,
    pub inserted: usize,
}

/// Replace the catalog with products fetched from `source_url`.
///
/// # Errors
///
/// Returns `CatalogError::Fetch` when the feed is unreachable or malformed
/// and `CatalogError::Store` when the replacement fails.
pub async fn seed_catalog(
    products: &dyn ProductStore,
    source_url: &str,
) -> Result<SeedReport, CatalogError> {
    tracing::info!(source = %source_url, "fetching seed products");

    let response = reqwest::get(source_url).await?.error_for_status()?;
    let feed: SeedFeed = response.json().await?;

    let rows = map_feed(feed);
    let fetched = rows.len();

    let inserted = products.replace_all(rows).await?;
    tracing::info!(fetched, inserted, "catalog seeded");

    Ok(SeedReport { fetched, inserted })
}

/// Reshape the feed so it aligns with the catalog schema.
fn map_feed(feed: SeedFeed) -> Vec<NewProduct> {
    feed.products
        .into_iter()
        .map(|product| NewProduct {
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
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Trimmed-down sample of the real feed shape.
    const FEED: &str = r#"{
        "products": [
            {
                "id": 1,
                "title": "Essence Mascara Lash Princess",
                "description": "A popular mascara.",
                "price": 9.99,
                "discountPercentage": 7.17,
                "rating": 4.94,
                "stock": 5,
                "brand": "Essence",
                "category": "beauty",
                "thumbnail": "https://cdn.dummyjson.com/1/thumbnail.png",
                "images": ["https://cdn.dummyjson.com/1/1.png"]
            },
            {
                "id": 2,
                "title": "Plain Widget",
                "description": "No optional fields at all.",
                "price": 3,
                "stock": 44
            }
        ],
        "total": 2,
        "skip": 0,
        "limit": 2
    }"#;

    #[test]
    fn test_feed_parsing_and_mapping() {
        let feed: SeedFeed = serde_json::from_str(FEED).unwrap();
        let rows = map_feed(feed);

        assert_eq!(rows.len(), 2);

        let first = rows.first().unwrap();
        assert_eq!(first.title, "Essence Mascara Lash Princess");
        assert_eq!(first.price, Decimal::new(9_99, 2));
        assert_eq!(first.stock, 5);
        assert_eq!(first.brand.as_deref(), Some("Essence"));
        assert_eq!(first.images.len(), 1);

        let second = rows.get(1).unwrap();
        assert_eq!(second.price, Decimal::from(3));
        assert!(second.brand.is_none());
        assert!(second.images.is_empty());
    }
}
