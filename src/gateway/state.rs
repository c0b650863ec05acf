use std::sync::Arc;

use crate::catalog::ProductCatalog;
use crate::orders::{OrderAggregator, OrderLifecycle, OrderStore};
use crate::user_auth::{AuthService, RegistrationPolicy, TokenIssuer, UserStore};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenIssuer>,
    pub aggregator: Arc<OrderAggregator>,
    pub lifecycle: Arc<OrderLifecycle>,
    /// Read side of the order store, also pinged by `/health`
    pub orders: Arc<dyn OrderStore>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        tokens: Arc<TokenIssuer>,
        policy: RegistrationPolicy,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(users, tokens.clone(), policy)),
            tokens,
            aggregator: Arc::new(OrderAggregator::new(catalog, orders.clone())),
            lifecycle: Arc::new(OrderLifecycle::new(orders.clone())),
            orders,
        }
    }
}
