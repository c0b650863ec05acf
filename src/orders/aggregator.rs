//! Checkout aggregation
//!
//! Resolves every requested line against the catalog, snapshots name, price
//! and image, computes the totals and persists the order as `pending`.
//! Any failed lookup aborts the checkout before anything is written.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::lifecycle::OrderStatus;
use super::models::{LineItem, NewOrder, Order, order_total};
use super::store::OrderStore;
use crate::catalog::ProductCatalog;
use crate::error::{AppError, AppResult};

/// One requested `{productId, quantity}` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub product_id: String,
    pub quantity: u32,
}

impl RequestedItem {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Who the order is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchaser {
    pub id: Uuid,
    pub name: String,
}

pub struct OrderAggregator {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn OrderStore>,
}

impl OrderAggregator {
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn OrderStore>) -> Self {
        Self { catalog, store }
    }

    /// Resolve `items` against the catalog and persist a pending order.
    pub async fn create_order(
        &self,
        purchaser: Purchaser,
        items: &[RequestedItem],
    ) -> AppResult<Order> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        if let Some(bad) = items.iter().find(|i| i.quantity == 0) {
            return Err(AppError::Validation(format!(
                "quantity for product {} must be at least 1",
                bad.product_id
            )));
        }
        if items.iter().any(|i| i.product_id.trim().is_empty()) {
            return Err(AppError::Validation("productId must not be empty".to_string()));
        }

        let line_items = self.resolve_items(items).await?;
        let total_price = order_total(&line_items)
            .ok_or_else(|| AppError::Validation("order total is out of range".to_string()))?;

        let new_order = NewOrder {
            purchaser_id: purchaser.id,
            purchaser_name: purchaser.name,
            items: line_items,
            total_price,
            status: OrderStatus::Pending,
            // Stores keep microseconds
            date: Utc::now().trunc_subsecs(6),
        };

        let order = self.store.save(new_order).await?;
        info!(
            order_id = %order.id,
            purchaser_id = %order.purchaser_id,
            items = order.items.len(),
            total_price = %order.total_price,
            "Order created"
        );
        Ok(order)
    }

    /// Single `{productId, quantity}` checkout
    pub async fn create_single_item_order(
        &self,
        purchaser: Purchaser,
        product_id: &str,
        quantity: u32,
    ) -> AppResult<Order> {
        self.create_order(purchaser, &[RequestedItem::new(product_id, quantity)])
            .await
    }

    /// Sequential lookups in submission order; the first failure wins.
    async fn resolve_items(&self, items: &[RequestedItem]) -> AppResult<Vec<LineItem>> {
        let mut line_items = Vec::with_capacity(items.len());
        for requested in items {
            let product = self
                .catalog
                .fetch_product(&requested.product_id)
                .await
                .map_err(|e| {
                    warn!(product_id = %requested.product_id, error = %e, "Product lookup failed");
                    AppError::from(e)
                })?;

            line_items.push(LineItem {
                product_id: requested.product_id.clone(),
                product_name: product.name,
                quantity: requested.quantity,
                price: product.price,
                image: product.image,
            });
        }
        Ok(line_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock::MockCatalog;
    use crate::orders::models::OrderFilter;
    use crate::orders::store::InMemoryOrderStore;
    use rust_decimal::Decimal;

    fn purchaser() -> Purchaser {
        Purchaser {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
        }
    }

    fn setup(catalog: MockCatalog) -> (Arc<MockCatalog>, Arc<InMemoryOrderStore>, OrderAggregator) {
        let catalog = Arc::new(catalog);
        let store = Arc::new(InMemoryOrderStore::new());
        let aggregator = OrderAggregator::new(catalog.clone(), store.clone());
        (catalog, store, aggregator)
    }

    #[tokio::test]
    async fn test_single_item_widget_scenario() {
        let (_, store, aggregator) =
            setup(MockCatalog::new().with_product("p1", "Widget", Decimal::from(10)));

        let order = aggregator
            .create_single_item_order(purchaser(), "p1", 3)
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, "p1");
        assert_eq!(order.items[0].product_name, "Widget");
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.total_price, Decimal::from(30));
        assert_eq!(order.status, OrderStatus::Pending);

        let stored = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn test_total_is_price_times_quantity_for_many_inputs() {
        let (catalog, _, aggregator) = setup(MockCatalog::new());
        for (cents, quantity) in [(1, 1u32), (999, 7), (12_345, 100), (50, 1_000)] {
            let price = Decimal::new(cents, 2);
            catalog.set_product("p", "Thing", price);
            let order = aggregator
                .create_single_item_order(purchaser(), "p", quantity)
                .await
                .unwrap();
            assert_eq!(order.total_price, price * Decimal::from(quantity));
            assert_eq!(order.status, OrderStatus::Pending);
        }
    }

    #[tokio::test]
    async fn test_multi_item_keeps_submission_order_and_snapshots() {
        let (catalog, _, aggregator) = setup(
            MockCatalog::new()
                .with_product("a", "Apple", Decimal::new(150, 2))
                .with_product("b", "Banana", Decimal::new(25, 2)),
        );

        let buyer = purchaser();
        let order = aggregator
            .create_order(
                buyer.clone(),
                &[RequestedItem::new("b", 4), RequestedItem::new("a", 2)],
            )
            .await
            .unwrap();

        assert_eq!(order.purchaser_id, buyer.id);
        assert_eq!(order.purchaser_name, "Ana");
        let ids: Vec<_> = order.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(order.items[1].image.as_deref(), Some("/img/a.png"));
        assert_eq!(order.total_price, Decimal::from(4));

        // Catalog price change after checkout leaves the order untouched
        catalog.set_product("a", "Apple v2", Decimal::from(100));
        assert_eq!(order.items[1].price, Decimal::new(150, 2));
        assert_eq!(order.items[1].product_name, "Apple");
    }

    #[tokio::test]
    async fn test_unavailable_catalog_persists_nothing() {
        let (catalog, store, aggregator) =
            setup(MockCatalog::new().with_product("a", "Apple", Decimal::ONE));
        catalog.set_unavailable("b");

        let err = aggregator
            .create_order(
                purchaser(),
                &[RequestedItem::new("a", 1), RequestedItem::new("b", 1)],
            )
            .await
            .unwrap_err();

        match err {
            AppError::UpstreamUnavailable { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_checkout() {
        let (catalog, store, aggregator) =
            setup(MockCatalog::new().with_product("a", "Apple", Decimal::ONE));

        let err = aggregator
            .create_order(
                purchaser(),
                &[RequestedItem::new("missing", 1), RequestedItem::new("a", 1)],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        // Stops at the first failure
        assert_eq!(catalog.fetch_count(), 1);
        assert!(store.find(OrderFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation() {
        let (catalog, _, aggregator) =
            setup(MockCatalog::new().with_product("a", "Apple", Decimal::ONE));

        let empty = aggregator.create_order(purchaser(), &[]).await.unwrap_err();
        assert!(matches!(empty, AppError::Validation(_)));

        let zero = aggregator
            .create_single_item_order(purchaser(), "a", 0)
            .await
            .unwrap_err();
        assert!(matches!(zero, AppError::Validation(_)));

        let blank = aggregator
            .create_single_item_order(purchaser(), "  ", 1)
            .await
            .unwrap_err();
        assert!(matches!(blank, AppError::Validation(_)));

        assert_eq!(catalog.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_persistence_error() {
        let (_, store, aggregator) =
            setup(MockCatalog::new().with_product("a", "Apple", Decimal::ONE));
        store.set_fail_writes(true);

        let err = aggregator
            .create_single_item_order(purchaser(), "a", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }
}
