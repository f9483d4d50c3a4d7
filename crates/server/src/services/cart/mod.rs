//! The cart state machine.
//!
//! Four operations — get, add, update, remove — each atomic per user: the
//! whole load→validate→mutate→persist window runs under that user's lock,
//! so two concurrent writers can never both read the same pre-state and
//! drop each other's change. Carts of different users proceed independently;
//! there is no global lock.

mod error;

pub use error::CartError;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use orchard_core::{CartItemId, ProductId, UserId};

use crate::models::cart::{Cart, CartItem, CartView};
use crate::services::inventory::{Availability, Inventory, InventoryError};
use crate::store::{CartStore, ProductStore};

/// Per-user mutual exclusion for cart mutations.
///
/// The registry map is held only long enough to hand out a user's entry;
/// the per-user mutex is then held across the await points of a whole
/// operation.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user_id: UserId) -> Arc<AsyncMutex<()>> {
        Arc::clone(
            self.inner
                .lock()
                .entry(user_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

/// Outcome of an add: the updated view, plus whether this stored the user's
/// first-ever cart record (drives 201 vs 200 at the HTTP layer).
#[derive(Debug)]
pub struct AddOutcome {
    pub cart: CartView,
    pub created_cart: bool,
}

/// The cart service.
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    inventory: Inventory,
    locks: UserLocks,
}

impl CartService {
    /// Create a cart service over the given stores.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        products: Arc<dyn ProductStore>,
        inventory: Inventory,
    ) -> Self {
        Self {
            carts,
            products,
            inventory,
            locks: UserLocks::default(),
        }
    }

    /// The user's cart, or an empty view if none was ever stored.
    ///
    /// Never creates a record.
    ///
    /// # Errors
    ///
    /// Fails only on store unavailability.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        match self.carts.find_by_user(user_id).await? {
            Some(cart) => self.view(&cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Add `quantity` of a product, merging into an existing line for the
    /// same product rather than creating a second one.
    ///
    /// # Errors
    ///
    /// `NonPositiveQuantity` for quantity < 1, `ProductNotFound` for an
    /// unknown product, `InsufficientStock` when the requested amount (or
    /// the merged line total) exceeds catalog stock.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<AddOutcome, CartError> {
        if quantity < 1 {
            return Err(CartError::NonPositiveQuantity);
        }

        let availability = self
            .availability(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if availability.stock < quantity {
            return Err(CartError::InsufficientStock);
        }

        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let existing = self.carts.find_by_user(user_id).await?;
        let created_cart = existing.is_none();
        let cart = existing.unwrap_or_else(|| Cart::empty(user_id));

        let items = match cart.line_for_product(product_id) {
            Some(line) => {
                // Merging must not push the line past what the catalog can
                // sell in total.
                if availability.stock < line.quantity.saturating_add(quantity) {
                    return Err(CartError::InsufficientStock);
                }
                cart.items
                    .iter()
                    .cloned()
                    .map(|mut item| {
                        if item.product_id == product_id {
                            item.quantity += quantity;
                        }
                        item
                    })
                    .collect()
            }
            None => cart
                .items
                .iter()
                .cloned()
                .chain(std::iter::once(CartItem::new(product_id, quantity)))
                .collect(),
        };

        let updated = Cart { user_id, items };
        self.carts.upsert(&updated).await?;

        Ok(AddOutcome {
            cart: self.view(&updated).await?,
            created_cart,
        })
    }

    /// Set a line's quantity. Absolute replace, not a delta.
    ///
    /// # Errors
    ///
    /// `CartNotFound` when the user has no stored cart, `ItemNotFound` for
    /// an unknown line id, `NonPositiveQuantity` and `InsufficientStock` as
    /// for adds.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::NonPositiveQuantity);
        }

        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        let item = cart.item(item_id).ok_or(CartError::ItemNotFound)?;

        let availability = self
            .availability(item.product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if availability.stock < quantity {
            return Err(CartError::InsufficientStock);
        }

        let items = cart
            .items
            .iter()
            .cloned()
            .map(|mut line| {
                if line.id == item_id {
                    line.quantity = quantity;
                }
                line
            })
            .collect();

        let updated = Cart { user_id, items };
        self.carts.upsert(&updated).await?;

        self.view(&updated).await
    }

    /// Remove a line. The cart record survives even when emptied.
    ///
    /// # Errors
    ///
    /// `CartNotFound` when the user has no stored cart, `ItemNotFound` for
    /// an unknown line id.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartView, CartError> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if cart.item(item_id).is_none() {
            return Err(CartError::ItemNotFound);
        }

        let items = cart
            .items
            .iter()
            .filter(|line| line.id != item_id)
            .cloned()
            .collect();

        let updated = Cart { user_id, items };
        self.carts.upsert(&updated).await?;

        self.view(&updated).await
    }

    async fn availability(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Availability>, CartError> {
        self.inventory
            .availability(product_id)
            .await
            .map_err(|e| match e {
                InventoryError::Unavailable => CartError::InventoryUnavailable,
                InventoryError::Store(store) => CartError::Store(store),
            })
    }

    /// Batch-fetch the referenced products and assemble the response view.
    async fn view(&self, cart: &Cart) -> Result<CartView, CartError> {
        let mut ids: Vec<ProductId> = cart.items.iter().map(|item| item.product_id).collect();
        ids.sort_unstable_by_key(ProductId::as_i32);
        ids.dedup();

        let products = self.products.find_many(&ids).await?;
        Ok(CartView::assemble(cart, &products))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::product::{NewProduct, Product};

    #[derive(Default)]
    struct MemoryCarts {
        carts: Mutex<HashMap<UserId, Cart>>,
    }

    impl MemoryCarts {
        fn stored(&self, user_id: UserId) -> Option<Cart> {
            self.carts.lock().get(&user_id).cloned()
        }

        fn record_count(&self) -> usize {
            self.carts.lock().len()
        }
    }

    #[async_trait]
    impl CartStore for MemoryCarts {
        async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
            Ok(self.carts.lock().get(&user_id).cloned())
        }

        async fn upsert(&self, cart: &Cart) -> Result<(), RepositoryError> {
            self.carts.lock().insert(cart.user_id, cart.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryProducts {
        products: Mutex<HashMap<ProductId, Product>>,
    }

    impl MemoryProducts {
        fn seed(&self, id: i32, price_cents: i64, stock: i32) -> ProductId {
            let product_id = ProductId::new(id);
            let now = Utc::now();
            self.products.lock().insert(
                product_id,
                Product {
                    id: product_id,
                    title: format!("Product {id}"),
                    description: "test product".to_string(),
                    price: Decimal::new(price_cents, 2),
                    discount_percentage: None,
                    rating: None,
                    stock,
                    brand: None,
                    category: None,
                    thumbnail: None,
                    images: Vec::new(),
                    created_at: now,
                    updated_at: now,
                },
            );
            product_id
        }

        fn drop_product(&self, id: ProductId) {
            self.products.lock().remove(&id);
        }
    }

    #[async_trait]
    impl ProductStore for MemoryProducts {
        async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(self.products.lock().get(&id).cloned())
        }

        async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
            let products = self.products.lock();
            Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
        }

        async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
            let products = self.products.lock();
            Ok(products
                .values()
                .filter(|p| category.is_none_or(|c| p.category.as_deref() == Some(c)))
                .cloned()
                .collect())
        }

        async fn create(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
            Err(RepositoryError::DataCorruption(
                "not used by cart tests".to_string(),
            ))
        }

        async fn replace_all(&self, _products: Vec<NewProduct>) -> Result<usize, RepositoryError> {
            Err(RepositoryError::DataCorruption(
                "not used by cart tests".to_string(),
            ))
        }
    }

    /// Product store whose lookups never answer in time.
    struct StalledProducts;

    #[async_trait]
    impl ProductStore for StalledProducts {
        async fn find_by_id(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok(None)
        }

        async fn find_many(&self, _ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn list(&self, _category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn create(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn replace_all(&self, _products: Vec<NewProduct>) -> Result<usize, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
    }

    fn fixture() -> (Arc<MemoryCarts>, Arc<MemoryProducts>, CartService) {
        let carts = Arc::new(MemoryCarts::default());
        let products = Arc::new(MemoryProducts::default());
        let inventory = Inventory::new(
            Arc::clone(&products) as Arc<dyn ProductStore>,
            None,
            Duration::from_secs(1),
        );
        let service = CartService::new(
            Arc::clone(&carts) as Arc<dyn CartStore>,
            Arc::clone(&products) as Arc<dyn ProductStore>,
            inventory,
        );
        (carts, products, service)
    }

    const USER: UserId = UserId::new(1);

    #[tokio::test]
    async fn get_cart_without_record_is_empty_and_creates_nothing() {
        let (carts, _products, service) = fixture();

        let view = service.get_cart(USER).await.unwrap();

        assert!(view.items.is_empty());
        assert_eq!(view.item_count, 0);
        assert_eq!(carts.record_count(), 0);
    }

    #[tokio::test]
    async fn add_creates_single_line() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 19_99, 10);

        let outcome = service.add_item(USER, product, 2).await.unwrap();

        assert!(outcome.created_cart);
        assert_eq!(outcome.cart.items.len(), 1);
        let line = outcome.cart.items.first().unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Some(Decimal::new(19_99, 2)));
        assert_eq!(carts.record_count(), 1);
    }

    #[tokio::test]
    async fn add_same_product_accumulates_quantity() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        service.add_item(USER, product, 2).await.unwrap();
        let outcome = service.add_item(USER, product, 3).await.unwrap();

        assert!(!outcome.created_cart);
        assert_eq!(outcome.cart.items.len(), 1);
        assert_eq!(outcome.cart.items.first().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn add_rejects_non_positive_quantity() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        for quantity in [0, -3] {
            let err = service.add_item(USER, product, quantity).await.unwrap_err();
            assert!(matches!(err, CartError::NonPositiveQuantity));
        }
        assert_eq!(carts.record_count(), 0);
    }

    #[tokio::test]
    async fn add_rejects_unknown_product() {
        let (carts, _products, service) = fixture();

        let err = service
            .add_item(USER, ProductId::new(99), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::ProductNotFound));
        assert_eq!(carts.record_count(), 0);
    }

    #[tokio::test]
    async fn add_rejects_quantity_beyond_stock() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 3);

        let err = service.add_item(USER, product, 4).await.unwrap_err();

        assert!(matches!(err, CartError::InsufficientStock));
        assert_eq!(carts.record_count(), 0);
    }

    #[tokio::test]
    async fn add_rejects_merge_exceeding_stock() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 5);

        service.add_item(USER, product, 3).await.unwrap();
        let err = service.add_item(USER, product, 3).await.unwrap_err();

        assert!(matches!(err, CartError::InsufficientStock));
        // The first add survives untouched.
        let stored = carts.stored(USER).unwrap();
        assert_eq!(stored.items.first().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn zero_stock_product_is_not_treated_as_missing() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 0);

        let err = service.add_item(USER, product, 1).await.unwrap_err();

        assert!(matches!(err, CartError::InsufficientStock));
    }

    #[tokio::test]
    async fn update_replaces_quantity() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        let outcome = service.add_item(USER, product, 5).await.unwrap();
        let item_id = outcome.cart.items.first().unwrap().id;

        let view = service.update_item(USER, item_id, 7).await.unwrap();

        // Replace, not 5 + 7.
        assert_eq!(view.items.first().unwrap().quantity, 7);
    }

    #[tokio::test]
    async fn update_keeps_item_id_stable() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        let outcome = service.add_item(USER, product, 2).await.unwrap();
        let item_id = outcome.cart.items.first().unwrap().id;

        let view = service.update_item(USER, item_id, 4).await.unwrap();
        assert_eq!(view.items.first().unwrap().id, item_id);

        let view = service.update_item(USER, item_id, 1).await.unwrap();
        assert_eq!(view.items.first().unwrap().id, item_id);
    }

    #[tokio::test]
    async fn update_rejects_non_positive_quantity() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        let outcome = service.add_item(USER, product, 2).await.unwrap();
        let item_id = outcome.cart.items.first().unwrap().id;

        let err = service.update_item(USER, item_id, 0).await.unwrap_err();
        assert!(matches!(err, CartError::NonPositiveQuantity));

        let view = service.get_cart(USER).await.unwrap();
        assert_eq!(view.items.first().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn update_rejects_quantity_beyond_stock() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 5);

        let outcome = service.add_item(USER, product, 2).await.unwrap();
        let item_id = outcome.cart.items.first().unwrap().id;

        let err = service.update_item(USER, item_id, 6).await.unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock));
    }

    #[tokio::test]
    async fn update_without_cart_reports_cart_not_found() {
        let (_carts, _products, service) = fixture();

        let err = service
            .update_item(USER, CartItemId::generate(), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::CartNotFound));
    }

    #[tokio::test]
    async fn update_unknown_item_reports_item_not_found() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);
        service.add_item(USER, product, 1).await.unwrap();

        let err = service
            .update_item(USER, CartItemId::generate(), 2)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::ItemNotFound));
    }

    #[tokio::test]
    async fn remove_deletes_only_the_targeted_line() {
        let (_carts, products, service) = fixture();
        let first = products.seed(1, 10_00, 10);
        let second = products.seed(2, 5_00, 10);

        service.add_item(USER, first, 1).await.unwrap();
        let outcome = service.add_item(USER, second, 2).await.unwrap();
        let second_line = outcome
            .cart
            .items
            .iter()
            .find(|line| line.product_id == second)
            .unwrap()
            .id;

        let view = service.remove_item(USER, second_line).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items.first().unwrap().product_id, first);
    }

    #[tokio::test]
    async fn remove_unknown_item_leaves_cart_untouched() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);
        service.add_item(USER, product, 2).await.unwrap();

        let err = service
            .remove_item(USER, CartItemId::generate())
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::ItemNotFound));
        assert_eq!(carts.stored(USER).unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn removing_last_item_keeps_the_record() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);

        let outcome = service.add_item(USER, product, 2).await.unwrap();
        let item_id = outcome.cart.items.first().unwrap().id;

        let view = service.remove_item(USER, item_id).await.unwrap();

        assert!(view.items.is_empty());
        // Emptied, not deleted.
        assert_eq!(carts.record_count(), 1);
        assert!(carts.stored(USER).unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 12_50, 10);

        let outcome = service.add_item(USER, product, 2).await.unwrap();
        assert_eq!(outcome.cart.items.first().unwrap().quantity, 2);
        let item_id = outcome.cart.items.first().unwrap().id;

        let view = service.update_item(USER, item_id, 5).await.unwrap();
        assert_eq!(view.items.first().unwrap().quantity, 5);
        assert_eq!(view.subtotal, Decimal::new(62_50, 2));

        let view = service.remove_item(USER, item_id).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(carts.record_count(), 1);
    }

    #[tokio::test]
    async fn view_tolerates_product_leaving_the_catalog() {
        let (_carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 10);
        service.add_item(USER, product, 2).await.unwrap();

        products.drop_product(product);

        let view = service.get_cart(USER).await.unwrap();
        let line = view.items.first().unwrap();
        assert_eq!(line.quantity, 2);
        assert!(line.title.is_none());
        assert_eq!(view.subtotal, Decimal::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_of_different_products_both_survive() {
        let (carts, products, service) = fixture();
        let first = products.seed(1, 10_00, 10);
        let second = products.seed(2, 5_00, 10);
        let service = Arc::new(service);

        let a = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.add_item(USER, first, 1).await }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.add_item(USER, second, 1).await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let stored = carts.stored(USER).unwrap();
        assert_eq!(stored.items.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_of_same_product_do_not_lose_updates() {
        let (carts, products, service) = fixture();
        let product = products.seed(1, 10_00, 50);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.add_item(USER, product, 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = carts.stored(USER).unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items.first().unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn stalled_inventory_surfaces_unavailable() {
        let carts = Arc::new(MemoryCarts::default());
        let stalled = Arc::new(StalledProducts);
        let inventory = Inventory::new(
            Arc::clone(&stalled) as Arc<dyn ProductStore>,
            None,
            Duration::from_millis(10),
        );
        let service = CartService::new(
            carts as Arc<dyn CartStore>,
            stalled as Arc<dyn ProductStore>,
            inventory,
        );

        let err = service
            .add_item(USER, ProductId::new(1), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::InventoryUnavailable));
    }
}
