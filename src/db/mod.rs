//! Database connection management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'customer',
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// No FK on purchaser_id, orders survive their users
const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id             UUID PRIMARY KEY,
    purchaser_id   UUID NOT NULL,
    purchaser_name TEXT NOT NULL,
    total_price    NUMERIC NOT NULL,
    status         TEXT NOT NULL,
    order_date     TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_ORDERS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_orders_purchaser_date
    ON orders (purchaser_id, order_date DESC)
"#;

const CREATE_ORDERS_DATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_orders_date ON orders (order_date DESC)
"#;

const CREATE_ORDER_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS order_items (
    order_id     UUID NOT NULL REFERENCES orders (id),
    position     INTEGER NOT NULL,
    product_id   TEXT NOT NULL,
    product_name TEXT NOT NULL,
    quantity     BIGINT NOT NULL CHECK (quantity > 0),
    price        NUMERIC NOT NULL,
    image        TEXT,
    PRIMARY KEY (order_id, position)
)
"#;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the tables if they do not exist yet.
    ///
    /// Called once at startup, before any store is handed out.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        tracing::info!("Initializing database schema...");
        for ddl in [
            CREATE_USERS_TABLE,
            CREATE_ORDERS_TABLE,
            CREATE_ORDERS_INDEX,
            CREATE_ORDERS_DATE_INDEX,
            CREATE_ORDER_ITEMS_TABLE,
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        tracing::info!("Database schema initialized");
        Ok(())
    }
}
