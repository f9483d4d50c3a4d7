//! Product store backed by `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;

use orchard_core::ProductId;

use super::RepositoryError;
use crate::models::product::{NewProduct, Product};
use crate::store::ProductStore;

const PRODUCT_COLUMNS: &str = "id, title, description, price, discount_percentage, rating, \
     stock, brand, category, thumbnail, images, created_at, updated_at";

/// Postgres-backed [`ProductStore`].
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let products = match category {
            Some(category) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY id"
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(products)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
             (title, description, price, discount_percentage, rating, stock, brand, category, thumbnail, images) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.title)
        .bind(product.description)
        .bind(product.price)
        .bind(product.discount_percentage)
        .bind(product.rating)
        .bind(product.stock)
        .bind(product.brand)
        .bind(product.category)
        .bind(product.thumbnail)
        .bind(product.images)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn replace_all(&self, products: Vec<NewProduct>) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        let mut inserted = 0_usize;
        for product in products {
            sqlx::query(
                "INSERT INTO products \
                 (title, description, price, discount_percentage, rating, stock, brand, category, thumbnail, images) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(product.title)
            .bind(product.description)
            .bind(product.price)
            .bind(product.discount_percentage)
            .bind(product.rating)
            .bind(product.stock)
            .bind(product.brand)
            .bind(product.category)
            .bind(product.thumbnail)
            .bind(product.images)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;

        Ok(inserted)
    }
}
