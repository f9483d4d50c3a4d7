//! Cart store backed by `PostgreSQL`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use orchard_core::{CartId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartItem};
use crate::store::CartStore;

/// Postgres-backed [`CartStore`].
///
/// One cart per user is a UNIQUE constraint on `carts.user_id`; `upsert`
/// converges concurrent first adds on a single row via `ON CONFLICT` and
/// holds that row's lock for the whole line-collection replacement.
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart_row = sqlx::query("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(cart_row) = cart_row else {
            return Ok(None);
        };
        let cart_id: CartId = cart_row.try_get("id")?;

        let rows = sqlx::query(
            "SELECT id, product_id, quantity FROM cart_items \
             WHERE cart_id = $1 ORDER BY position",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(CartItem {
                id: row.try_get("id")?,
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
            });
        }

        Ok(Some(Cart { user_id, items }))
    }

    async fn upsert(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Converge concurrent first adds on one row, then take the row lock
        // for the rest of the replacement.
        sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(cart.user_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(cart.user_id)
            .fetch_one(&mut *tx)
            .await?;
        let cart_id: CartId = row.try_get("id")?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity, position) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id)
            .bind(cart_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
