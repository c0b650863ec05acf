//! Order service
//!
//! Checkout with catalog enrichment, an order status lifecycle and the
//! registration/login flow that issues the bearer tokens gating them.
//!
//! # Modules
//!
//! - [`config`] - YAML + environment configuration, validated once at boot
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - service error taxonomy and its HTTP mapping
//! - [`db`] - PostgreSQL pool and schema
//! - [`catalog`] - product catalog client
//! - [`orders`] - aggregation, persistence and lifecycle of orders
//! - [`user_auth`] - credentials, password hashing and JWT issuance
//! - [`gateway`] - axum router and server

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod orders;
pub mod user_auth;

pub use error::{AppError, AppResult};
