//! Product catalog access
//!
//! The catalog is an external service that owns product identity, name,
//! price and image. This service only ever reads it by product id.

pub mod client;

pub use client::HttpCatalogClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Canonical product attributes as returned by the catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

/// Catalog lookup failures
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The catalog answered and has no such product
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The catalog could not be reached or answered with an error.
    /// `status` and `detail` carry the upstream response when there was one.
    #[error("Catalog service unavailable: {message}")]
    Unavailable {
        status: Option<u16>,
        detail: Option<serde_json::Value>,
        message: String,
    },
}

impl CatalogError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        CatalogError::Unavailable {
            status: None,
            detail: None,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound(_) => "PRODUCT_NOT_FOUND",
            CatalogError::Unavailable { .. } => "UPSTREAM_UNAVAILABLE",
        }
    }
}

/// Fetch-by-id contract of the catalog service
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_product(&self, product_id: &str) -> Result<Product, CatalogError>;
}

/// In-memory catalog for tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockCatalog {
        products: Mutex<HashMap<String, Product>>,
        /// Product ids whose lookup fails as if the catalog were down
        unavailable: Mutex<Vec<String>>,
        fetch_count: AtomicUsize,
    }

    impl MockCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_product(self, id: &str, name: &str, price: Decimal) -> Self {
            self.set_product(id, name, price);
            self
        }

        pub fn set_product(&self, id: &str, name: &str, price: Decimal) {
            self.products.lock().unwrap().insert(
                id.to_string(),
                Product {
                    name: name.to_string(),
                    price,
                    image: Some(format!("/img/{}.png", id)),
                },
            );
        }

        pub fn set_unavailable(&self, id: &str) {
            self.unavailable.lock().unwrap().push(id.to_string());
        }

        pub fn fetch_count(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductCatalog for MockCatalog {
        async fn fetch_product(&self, product_id: &str) -> Result<Product, CatalogError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);

            if self
                .unavailable
                .lock()
                .unwrap()
                .iter()
                .any(|id| id == product_id)
            {
                return Err(CatalogError::Unavailable {
                    status: Some(503),
                    detail: Some(serde_json::json!({ "message": "maintenance" })),
                    message: "catalog responded with 503".to_string(),
                });
            }

            self.products
                .lock()
                .unwrap()
                .get(product_id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
        }
    }
}
