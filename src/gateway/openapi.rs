//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3002/docs`
//! - OpenAPI JSON: `http://localhost:3002/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::gateway::health::{HealthResponse, ServiceInfo};
use crate::orders::handlers::{
    CheckoutItem, CheckoutRequest, CheckoutResponse, MultiItemCheckout, SingleItemCheckout,
    UpdateStatusRequest,
};
use crate::orders::{LegacyOrderView, LineItem, Order, OrderStatus};
use crate::user_auth::Role;
use crate::user_auth::models::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserView,
};

/// Bearer JWT issued by `/auth/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Service API",
        version = "1.0.0",
        description = "Checkout with catalog enrichment, order lifecycle and user authentication."
    ),
    servers(
        (url = "http://localhost:3002", description = "Development"),
    ),
    paths(
        crate::gateway::health::service_info,
        crate::gateway::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::orders::handlers::create_order,
        crate::orders::handlers::list_orders,
        crate::orders::handlers::update_status,
    ),
    components(
        schemas(
            ErrorResponse,
            ServiceInfo,
            HealthResponse,
            Role,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            UserView,
            OrderStatus,
            LineItem,
            Order,
            LegacyOrderView,
            CheckoutItem,
            MultiItemCheckout,
            SingleItemCheckout,
            CheckoutRequest,
            CheckoutResponse,
            UpdateStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Orders", description = "Checkout, listing and status changes (bearer token required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
