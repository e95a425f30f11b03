//! Owned Postgres pool handle: parameterized execution with timing,
//! transaction scoping and liveness reporting.

use crate::domain::query::{BuiltQuery, SqlParam};
use crate::error::{AppError, Result};
use crate::infra::config::DatabaseConfig;
use futures_util::future::BoxFuture;
use serde::Serialize;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const SQL_LOG_PREFIX: usize = 100;

/// Rows of one executed statement, with the statement itself and how long it
/// took. The SQL travels back to clients on purpose.
#[derive(Debug, Clone)]
pub struct Executed<T> {
    pub rows: Vec<T>,
    pub elapsed_ms: f64,
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total_connections: u32,
    pub max_connections: u32,
    pub active_connections: u32,
    pub free_connections: u32,
}

/// Cloneable handle; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    max_connections: u32,
    connected: Arc<AtomicBool>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("max_connections", &self.max_connections)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Database {
    /// Builds the pool without opening a connection. The first statement
    /// connects; a saturated pool makes callers wait at most
    /// `acquire_timeout` before failing with a connection error.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);
        info!(
            database = %config.display_target(),
            max_connections = config.max_connections,
            "Database pool configured"
        );
        Ok(Self {
            pool,
            max_connections: config.max_connections,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Builds the pool and verifies it with a round trip.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::connect_lazy(config)?;
        db.ensure_connected().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Runs a probe when the pool has never been verified or a previous
    /// statement lost its connection.
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| self.observe(e.into()))?;
        if !self.connected.swap(true, Ordering::AcqRel) {
            info!("Database connection established");
        }
        Ok(())
    }

    /// Executes `query`, decoding every row as `T`.
    pub async fn execute<T>(&self, query: &BuiltQuery) -> Result<Executed<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.ensure_connected().await?;

        let started = Instant::now();
        let mut statement = sqlx::query_as::<_, T>(&query.sql);
        for param in &query.params {
            statement = match param {
                SqlParam::Int(v) => statement.bind(*v),
                SqlParam::Float(v) => statement.bind(*v),
                SqlParam::Text(v) => statement.bind(v.clone()),
            };
        }

        let outcome = statement.fetch_all(&self.pool).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(rows) => {
                debug!(
                    elapsed_ms,
                    rows = rows.len(),
                    params = query.params.len(),
                    sql = %sql_prefix(&query.sql),
                    "Executed query"
                );
                Ok(Executed {
                    rows,
                    elapsed_ms,
                    sql: query.sql.clone(),
                    params: query.params.clone(),
                })
            }
            Err(e) => {
                error!(
                    elapsed_ms,
                    sql = %sql_prefix(&query.sql),
                    error = %e,
                    "Query failed"
                );
                Err(self.observe(e.into()))
            }
        }
    }

    /// Runs `work` inside a transaction on a dedicated connection. Commits
    /// when `work` succeeds; otherwise rolls back and returns the original
    /// error. The connection goes back to the pool on every path.
    pub async fn with_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T>>,
    {
        self.ensure_connected().await?;
        let mut tx = self.pool.begin().await.map_err(|e| self.observe(e.into()))?;

        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|e| self.observe(e.into()))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(self.observe(e))
            }
        }
    }

    /// Liveness probe. Returns the round trip in milliseconds; failures are
    /// reported to the caller, never retried here.
    pub async fn ping(&self) -> Result<f64> {
        let started = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| self.observe(e.into()))?;
        self.connected.store(true, Ordering::Release);
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    pub fn pool_stats(&self) -> PoolStats {
        let total = self.pool.size();
        let free = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX).min(total);
        PoolStats {
            total_connections: total,
            max_connections: self.max_connections,
            active_connections: total - free,
            free_connections: free,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        self.connected.store(false, Ordering::Release);
        info!("Database pool closed");
    }

    /// Marks the pool unverified after a connectivity failure so the next
    /// statement probes again.
    fn observe(&self, err: AppError) -> AppError {
        if err.is_connection_failure() && self.connected.swap(false, Ordering::AcqRel) {
            warn!(error = %err, "Database connection lost");
        }
        err
    }
}

fn sql_prefix(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(SQL_LOG_PREFIX) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
