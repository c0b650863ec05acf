//! Orders: checkout aggregation, persistence and the status lifecycle

pub mod aggregator;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod store;

pub use aggregator::{OrderAggregator, Purchaser, RequestedItem};
pub use lifecycle::{OrderLifecycle, OrderStatus, UnknownStatus};
pub use models::{LegacyOrderView, LineItem, NewOrder, Order, OrderFilter};
pub use store::{InMemoryOrderStore, OrderStore, PgOrderStore};
