//! HTTP client for the catalog service's `GET /products/{id}` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use tracing::{debug, warn};

use super::{CatalogError, Product, ProductCatalog};

pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalogClient {
    /// Every request is bounded by `timeout`; a timeout surfaces as
    /// `CatalogError::Unavailable`.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, CatalogError> {
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::unavailable(format!(
                "catalog base URL cannot be a base: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CatalogError::unavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/products/{id}`, keeping any path prefix of the base URL.
    pub fn product_url(&self, product_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("products").push(product_id);
        }
        url
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalogClient {
    async fn fetch_product(&self, product_id: &str) -> Result<Product, CatalogError> {
        // Dot segments collapse out of the URL path and would hit another endpoint
        if matches!(product_id, "." | "..") {
            return Err(CatalogError::NotFound(product_id.to_string()));
        }
        let url = self.product_url(product_id);
        debug!(product_id, url = %url, "Fetching product from catalog");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "catalog request timed out".to_string()
                } else {
                    format!("catalog request failed: {}", e)
                };
                warn!(product_id, error = %e, "Catalog unreachable");
                CatalogError::unavailable(message)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(product_id.to_string()));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(product_id, error = %e, "Failed to read catalog response");
            CatalogError::unavailable(format!("failed to read catalog response: {}", e))
        })?;

        if !status.is_success() {
            warn!(product_id, status = status.as_u16(), "Catalog returned an error");
            return Err(CatalogError::Unavailable {
                status: Some(status.as_u16()),
                detail: upstream_detail(&body),
                message: format!("catalog responded with {}", status),
            });
        }

        // An empty or `null` body means the catalog has nothing for this id
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(CatalogError::NotFound(product_id.to_string()));
        }
        let product: Option<Product> = serde_json::from_slice(&body).map_err(|e| {
            warn!(product_id, error = %e, "Malformed catalog payload");
            CatalogError::unavailable(format!("invalid product payload: {}", e))
        })?;
        let product = product.ok_or_else(|| CatalogError::NotFound(product_id.to_string()))?;

        if product.price.is_sign_negative() {
            return Err(CatalogError::unavailable(format!(
                "catalog returned negative price for product {}",
                product_id
            )));
        }

        Ok(product)
    }
}

/// Forward the upstream body as JSON when it is JSON, as a string otherwise.
fn upstream_detail(body: &[u8]) -> Option<serde_json::Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok().or_else(|| {
        Some(serde_json::Value::String(
            String::from_utf8_lossy(body).into_owned(),
        ))
    })
}
