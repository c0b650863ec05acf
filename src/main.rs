//! Order service entry point
//!
//! ```text
//! config ──▶ logging ──▶ validate ──▶ stores (+schema) ──▶ catalog client ──▶ gateway
//! ```
//!
//! Misconfiguration is fatal here, before the listener is bound.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use order_service::catalog::{HttpCatalogClient, ProductCatalog};
use order_service::config::AppConfig;
use order_service::db::Database;
use order_service::gateway::{self, state::AppState};
use order_service::logging::init_logging;
use order_service::orders::{InMemoryOrderStore, OrderStore, PgOrderStore};
use order_service::user_auth::{
    InMemoryUserStore, PgUserStore, RegistrationPolicy, TokenIssuer, UserStore,
};

/// Selects the process-local stores instead of PostgreSQL
const MEMORY_DATABASE_URL: &str = "memory://";

fn arg_value(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1).cloned())
}

/// Environment named by `--env`/`-e` or `APP_ENV`, if any
fn explicit_env(args: &[String]) -> Option<String> {
    arg_value(args, &["--env", "-e"]).or_else(|| std::env::var("APP_ENV").ok())
}

async fn open_stores(
    database_url: &str,
) -> anyhow::Result<(Arc<dyn UserStore>, Arc<dyn OrderStore>)> {
    if database_url == MEMORY_DATABASE_URL {
        tracing::warn!("Using in-memory stores; data is lost on exit");
        return Ok((
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryOrderStore::new()),
        ));
    }

    let db = Database::connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.init_schema()
        .await
        .context("Failed to initialize database schema")?;

    let pool = db.pool().clone();
    Ok((
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgOrderStore::new(pool)),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let explicit = explicit_env(&args);
    let env = explicit.clone().unwrap_or_else(|| "dev".to_string());

    let mut config = AppConfig::load(&env).context("Failed to load configuration")?;
    if let Some(port) = arg_value(&args, &["--port"]) {
        config.gateway.port = port.parse().context("--port must be a port number")?;
    }

    let _log_guard = init_logging(&config);
    tracing::info!(env = %env, git_hash = env!("GIT_HASH"), "Starting order service");

    let settings = config
        .validate(explicit.as_deref() == Some("dev"))
        .inspect_err(|e| {
            tracing::error!(code = e.code(), "Refusing to start: {}", e);
        })?;

    let (users, orders) = open_stores(&settings.database_url).await?;

    let catalog: Arc<dyn ProductCatalog> = Arc::new(
        HttpCatalogClient::new(
            settings.catalog_base_url,
            Duration::from_millis(config.catalog.timeout_ms),
        )
        .context("Failed to build catalog client")?,
    );
    let tokens = Arc::new(TokenIssuer::new(&settings.jwt_secret));

    let state = Arc::new(AppState::new(
        users,
        orders,
        catalog,
        tokens,
        RegistrationPolicy::from_config(&config.auth),
    ));

    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .context("Invalid gateway host/port")?;
    gateway::run_server(addr, state).await?;

    tracing::info!("Order service stopped");
    Ok(())
}
