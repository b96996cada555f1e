//! PostgreSQL access for the CRM tools.
//!
//! `PgStore` owns one connection opened at startup and closed explicitly on
//! shutdown; handlers see it through the `RowStore` trait.

use std::future::Future;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;
use tracing::{error, info};

use crate::config::DatabaseConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to decode row: {0}")]
    Decode(String),

    #[error("database connection is closed")]
    Closed,
}

/// Read access to a relational store.
///
/// Queries are fixed and parameterless, and must select exactly one JSON
/// column per row (e.g. `SELECT row_to_json(r) FROM (...) r`). Rows come
/// back in the order the query specifies. Zero rows is `Ok(vec![])`.
pub trait RowStore: Send + Sync + 'static {
    fn fetch_json_rows(&self, sql: &str) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;
}

/// PostgreSQL-backed store with a single connection held for the life of
/// the process.
pub struct PgStore {
    client: tokio_postgres::Client,
    connection: Mutex<Option<JoinHandle<()>>>,
}

impl PgStore {
    /// Open the connection and start the task that drives it.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let (client, connection) = config.to_pg_config().connect(NoTls).await?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {}", e);
            }
        });

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to CRM database"
        );

        Ok(Self {
            client,
            connection: Mutex::new(Some(handle)),
        })
    }

    /// Release the connection. Later queries fail with a connection error.
    pub async fn close(&self) {
        let Some(handle) = self.connection.lock().await.take() else {
            return;
        };
        handle.abort();
        match handle.await {
            Ok(()) => info!("Database connection closed"),
            Err(e) if e.is_cancelled() => info!("Database connection closed"),
            Err(e) => error!("Database connection task failed: {}", e),
        }
    }
}

impl RowStore for PgStore {
    async fn fetch_json_rows(&self, sql: &str) -> Result<Vec<Value>, StoreError> {
        if self.client.is_closed() {
            return Err(StoreError::Closed);
        }
        let rows = self.client.query(sql, &[]).await?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, Value>(0)
                    .map_err(|e| StoreError::Decode(e.to_string()))
            })
            .collect()
    }
}
