//! Cart domain and view types.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use orchard_core::{CartItemId, ProductId, UserId};

use super::product::Product;

/// A single line in a cart.
///
/// Line identity is assigned when the line is first appended and survives
/// every later rebuild of the collection, so clients can address updates
/// and removals at a stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
}

impl CartItem {
    /// A fresh line with a newly minted id.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            id: CartItemId::generate(),
            product_id,
            quantity,
        }
    }
}

/// A user's cart: the unit of persistence.
///
/// Mutations construct a new line collection and commit it as a single
/// replacement; a partially applied update is never observable.
#[derive(Debug, Clone)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart for a user with no stored record.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }

    /// Find a line by its id.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Find the line holding a given product, if any. At most one line per
    /// product exists; duplicate adds merge into it.
    #[must_use]
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// Cart line display data, assembled from the cart and the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// `None` when the referenced product has left the catalog.
    pub title: Option<String>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

/// The cart as returned by every cart endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: Decimal,
    pub item_count: i32,
}

impl CartView {
    /// The view of a cart that was never stored.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
        }
    }

    /// Assemble the view from a cart and the products its lines reference.
    ///
    /// Products are batch-fetched by the caller; the storage layer knows
    /// nothing about cross-entity joins. Lines whose product has vanished
    /// from the catalog keep their place with no price contribution.
    #[must_use]
    pub fn assemble(cart: &Cart, products: &[Product]) -> Self {
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let items: Vec<CartLineView> = cart
            .items
            .iter()
            .map(|item| {
                let product = by_id.get(&item.product_id).copied();
                let unit_price = product.map(|p| p.price);
                let line_total = unit_price.map(|price| price * Decimal::from(item.quantity));
                CartLineView {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    title: product.map(|p| p.title.clone()),
                    unit_price,
                    line_total,
                }
            })
            .collect();

        let subtotal = items.iter().filter_map(|line| line.line_total).sum();
        let item_count = cart.items.iter().map(|item| item.quantity).sum();

        Self {
            items,
            subtotal,
            item_count,
        }
    }
}
