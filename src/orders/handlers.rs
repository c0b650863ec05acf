//! `/transactions` endpoints
//!
//! All three routes sit behind the bearer-token middleware.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::PathRejection, rejection::QueryRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::aggregator::{Purchaser, RequestedItem};
use super::lifecycle::OrderStatus;
use super::models::{LegacyOrderView, Order, OrderFilter};
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::gateway::extract::JsonBody;
use crate::gateway::state::AppState;
use crate::user_auth::AuthUser;

/// One requested line. Client-sent `price`/`productName` are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    #[serde(alias = "product_id")]
    #[schema(example = "p1")]
    pub product_id: String,
    #[schema(example = 3, minimum = 1)]
    pub quantity: u32,
}

/// Multi-item checkout. A client `totalPrice` is ignored; totals are recomputed.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiItemCheckout {
    /// Defaults to the caller; only admins may order for someone else
    #[serde(default, alias = "purchaser_id")]
    pub purchaser_id: Option<Uuid>,
    /// Defaults to the name in the caller's token
    #[serde(default, alias = "purchaser_name")]
    pub purchaser_name: Option<String>,
    pub items: Vec<CheckoutItem>,
}

/// Legacy single-product checkout
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleItemCheckout {
    #[serde(alias = "product_id")]
    #[schema(example = "p1")]
    pub product_id: String,
    #[schema(example = 3, minimum = 1)]
    pub quantity: u32,
}

/// POST /transactions body; the `items` shape wins when both would match
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CheckoutRequest {
    Items(MultiItemCheckout),
    Single(SingleItemCheckout),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CheckoutResponse {
    Order(Order),
    Legacy(LegacyOrderView),
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    /// Only orders of this purchaser
    #[serde(default, alias = "purchaser_id")]
    pub purchaser_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "process")]
    pub status: String,
}

/// Resolve who a multi-item checkout is for
fn resolve_purchaser(user: &AuthUser, req: &MultiItemCheckout) -> AppResult<Purchaser> {
    let id = match req.purchaser_id {
        Some(id) if id != user.id && !user.is_admin() => {
            return Err(AppError::Forbidden(
                "cannot place orders for another purchaser".to_string(),
            ));
        }
        Some(id) => id,
        None => user.id,
    };

    let name = req
        .purchaser_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user.name.clone());

    Ok(Purchaser { id, name })
}

/// Create an order
///
/// POST /transactions
#[utoipa::path(
    post,
    path = "/transactions",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Ordering for another purchaser", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 502, description = "Catalog service unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(req): JsonBody<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    let response = match req {
        CheckoutRequest::Single(single) => {
            let purchaser = Purchaser {
                id: user.id,
                name: user.name.clone(),
            };
            let order = state
                .aggregator
                .create_single_item_order(purchaser, &single.product_id, single.quantity)
                .await?;
            let view = LegacyOrderView::from_order(&order).ok_or_else(|| {
                AppError::Internal(format!("order {} is not single-item", order.id))
            })?;
            CheckoutResponse::Legacy(view)
        }
        CheckoutRequest::Items(multi) => {
            let purchaser = resolve_purchaser(&user, &multi)?;
            let items: Vec<RequestedItem> = multi
                .items
                .into_iter()
                .map(|i| RequestedItem::new(i.product_id, i.quantity))
                .collect();
            let order = state.aggregator.create_order(purchaser, &items).await?;
            CheckoutResponse::Order(order)
        }
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List orders, newest first
///
/// GET /transactions
#[utoipa::path(
    get,
    path = "/transactions",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<Order>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Listing another purchaser's orders", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Order>>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let filter = if user.is_admin() {
        OrderFilter {
            purchaser_id: query.purchaser_id,
        }
    } else {
        match query.purchaser_id {
            Some(id) if id != user.id => {
                return Err(AppError::Forbidden(
                    "cannot list orders of another purchaser".to_string(),
                ));
            }
            _ => OrderFilter::purchaser(user.id),
        }
    };

    Ok(Json(state.orders.find(filter).await?))
}

/// Change an order's status (admin only)
///
/// PUT /transactions/{id}
#[utoipa::path(
    put,
    path = "/transactions/{id}",
    params(
        ("id" = Uuid, Path, description = "Order id")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = Order),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Illegal status transition", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    user.require_admin()?;

    // A malformed id cannot name an existing order
    let Path(id) = id.map_err(|_| AppError::NotFound("order".to_string()))?;
    let next = req
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let order = state.lifecycle.set_status(id, next).await?;
    tracing::info!(admin_id = %user.id, order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_auth::Role;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
            name: "Ana".to_string(),
        }
    }

    fn multi(purchaser_id: Option<Uuid>, purchaser_name: Option<&str>) -> MultiItemCheckout {
        MultiItemCheckout {
            purchaser_id,
            purchaser_name: purchaser_name.map(str::to_string),
            items: vec![],
        }
    }

    #[test]
    fn test_checkout_body_shapes() {
        let legacy: CheckoutRequest =
            serde_json::from_str(r#"{"productId":"p1","quantity":3}"#).unwrap();
        assert!(matches!(legacy, CheckoutRequest::Single(ref s) if s.product_id == "p1" && s.quantity == 3));

        let snake: CheckoutRequest =
            serde_json::from_str(r#"{"product_id":"p1","quantity":1}"#).unwrap();
        assert!(matches!(snake, CheckoutRequest::Single(_)));

        let multi: CheckoutRequest = serde_json::from_str(
            r#"{"purchaserName":"Ana","items":[{"productId":"a","quantity":2,"price":0.01}],"totalPrice":0.01}"#,
        )
        .unwrap();
        match multi {
            CheckoutRequest::Items(m) => {
                assert_eq!(m.items.len(), 1);
                assert_eq!(m.items[0].quantity, 2);
                assert_eq!(m.purchaser_id, None);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        assert!(
            serde_json::from_str::<CheckoutRequest>(r#"{"productId":"p1","quantity":-1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_customer_orders_for_self_only() {
        let customer = user(Role::Customer);

        let own = resolve_purchaser(&customer, &multi(None, None)).unwrap();
        assert_eq!(own.id, customer.id);
        assert_eq!(own.name, "Ana");

        let explicit_self = resolve_purchaser(&customer, &multi(Some(customer.id), Some("A. N."))).unwrap();
        assert_eq!(explicit_self.name, "A. N.");

        let err = resolve_purchaser(&customer, &multi(Some(Uuid::new_v4()), None)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_orders_on_behalf() {
        let admin = user(Role::Admin);
        let other = Uuid::new_v4();
        let purchaser = resolve_purchaser(&admin, &multi(Some(other), Some("  "))).unwrap();
        assert_eq!(purchaser.id, other);
        // Blank name falls back to the token name
        assert_eq!(purchaser.name, "Ana");
    }
}
