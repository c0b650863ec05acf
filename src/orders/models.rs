//! Order records
//!
//! An order owns its line items by value. Product name, price and image are
//! snapshots taken at checkout; later catalog changes never touch a stored order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::lifecycle::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at order time
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 10.0)]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    /// `price × quantity`, `None` on overflow
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of all line totals, `None` on overflow
pub fn order_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
}

/// A persisted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub purchaser_id: Uuid,
    /// Snapshot of the purchaser's name at checkout
    pub purchaser_name: String,
    /// In submission order
    pub items: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 30.0)]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
}

/// An order that has not been assigned an id by the store yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub purchaser_id: Uuid,
    pub purchaser_name: String,
    pub items: Vec<LineItem>,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid) -> Order {
        Order {
            id,
            purchaser_id: self.purchaser_id,
            purchaser_name: self.purchaser_name,
            items: self.items,
            total_price: self.total_price,
            status: self.status,
            date: self.date,
        }
    }
}

/// Lookup filter for `OrderStore::find`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub purchaser_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn purchaser(purchaser_id: Uuid) -> Self {
        Self {
            purchaser_id: Some(purchaser_id),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.purchaser_id
            .is_none_or(|purchaser_id| order.purchaser_id == purchaser_id)
    }
}

/// Flattened single-item shape answered to legacy `{productId, quantity}` checkouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOrderView {
    pub id: Uuid,
    pub purchaser_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 30.0)]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
}

impl LegacyOrderView {
    /// Only single-item orders have a legacy shape.
    pub fn from_order(order: &Order) -> Option<Self> {
        let [item] = order.items.as_slice() else {
            return None;
        };
        Some(Self {
            id: order.id,
            purchaser_id: order.purchaser_id,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            total_price: order.total_price,
            status: order.status,
            date: order.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: Decimal, quantity: u32) -> LineItem {
        LineItem {
            product_id: id.to_string(),
            product_name: format!("Product {}", id),
            quantity,
            price,
            image: None,
        }
    }

    fn order(items: Vec<LineItem>) -> Order {
        NewOrder {
            purchaser_id: Uuid::new_v4(),
            purchaser_name: "Ana".to_string(),
            total_price: order_total(&items).unwrap(),
            items,
            status: OrderStatus::Pending,
            date: Utc::now(),
        }
        .into_order(Uuid::new_v4())
    }

    #[test]
    fn test_order_total() {
        let items = vec![
            item("a", Decimal::new(1050, 2), 3),
            item("b", Decimal::from(2), 1),
        ];
        assert_eq!(order_total(&items), Some(Decimal::new(3350, 2)));
        assert_eq!(order_total(&[]), Some(Decimal::ZERO));
    }

    #[test]
    fn test_order_total_overflow() {
        let items = vec![item("a", Decimal::MAX, 2)];
        assert_eq!(order_total(&items), None);
    }

    #[test]
    fn test_filter_matches() {
        let o = order(vec![item("a", Decimal::ONE, 1)]);
        assert!(OrderFilter::all().matches(&o));
        assert!(OrderFilter::purchaser(o.purchaser_id).matches(&o));
        assert!(!OrderFilter::purchaser(Uuid::new_v4()).matches(&o));
    }

    #[test]
    fn test_legacy_view_single_item_only() {
        let single = order(vec![item("p1", Decimal::from(10), 3)]);
        let view = LegacyOrderView::from_order(&single).unwrap();
        assert_eq!(view.product_id, "p1");
        assert_eq!(view.quantity, 3);
        assert_eq!(view.total_price, Decimal::from(30));

        let multi = order(vec![
            item("a", Decimal::ONE, 1),
            item("b", Decimal::ONE, 1),
        ]);
        assert!(LegacyOrderView::from_order(&multi).is_none());
    }

    #[test]
    fn test_order_json_shape() {
        let o = order(vec![item("p1", Decimal::from(10), 3)]);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["totalPrice"], serde_json::json!(30.0));
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["productId"], "p1");
        assert_eq!(json["items"][0]["price"], serde_json::json!(10.0));
        assert!(json["items"][0].get("image").is_none());
    }
}
