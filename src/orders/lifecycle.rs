//! Order lifecycle state machine
//!
//! ```text
//! pending ──▶ process ──▶ completed
//!    │           │
//!    └───────────┴──────▶ cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::models::Order;
use super::store::OrderStore;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Initial state, set at checkout
    Pending,
    /// Being processed/fulfilled
    Process,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Process,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Process) | (Pending, Cancelled) | (Process, Completed) | (Process, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Process => "process",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown order status '{}', expected one of: pending, process, completed, cancelled",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Applies status changes to persisted orders through the transition table
pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Move order `id` to `next`.
    ///
    /// Setting the status the order already has returns it unchanged.
    pub async fn set_status(&self, id: Uuid, next: OrderStatus) -> AppResult<Order> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;

        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        match self.store.update_status(id, current.status, next).await? {
            Some(updated) => {
                info!(order_id = %id, from = %current.status, to = %next, "Order status changed");
                Ok(updated)
            }
            // Someone else changed the status in between; judge against the fresh value
            None => {
                let fresh = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
                if fresh.status == next {
                    Ok(fresh)
                } else {
                    Err(AppError::InvalidTransition {
                        from: fresh.status,
                        to: next,
                    })
                }
            }
        }
    }
}
