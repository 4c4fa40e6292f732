//! Statement execution.
//!
//! The migrator talks to the server only through [`SchemaExecutor`], which
//! keeps the orchestration independent of the driver:
//! - [`ServerConnection`] runs statements on the live connection
//! - [`DryRunExecutor`] forwards reads and only logs writes
//!
//! Statements are sent as raw SQL (text protocol). None of them takes
//! parameters, and DDL is not accepted as a prepared statement by every server.

use crate::db::pool::ServerConnection;
use crate::error::{DbError, DbResult};
use sqlx::Row;
use sqlx::mysql::MySqlRow;
use std::future::Future;
use tracing::{debug, info};

/// Executes the statements a migration needs, one at a time.
pub trait SchemaExecutor {
    /// Run a query and return the first column of every row as text.
    fn fetch_names(&self, sql: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<u64>> + Send;
}

impl SchemaExecutor for ServerConnection {
    async fn fetch_names(&self, sql: &str) -> DbResult<Vec<String>> {
        use sqlx::Executor;

        debug!(sql = %sql, "Executing query");
        let rows = self.pool().fetch_all(sql).await?;
        rows.iter().map(first_column_text).collect()
    }

    async fn execute(&self, sql: &str) -> DbResult<u64> {
        use sqlx::Executor;

        debug!(sql = %sql, "Executing statement");
        let result = self.pool().execute(sql).await?;
        debug!(rows_affected = result.rows_affected(), "Statement finished");
        Ok(result.rows_affected())
    }
}

/// `SHOW TABLES` reports names as VARCHAR on most servers but as binary
/// strings on some collations.
fn first_column_text(row: &MySqlRow) -> DbResult<String> {
    match row.try_get::<String, _>(0) {
        Ok(name) => Ok(name),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(0).map_err(DbError::from)?;
            String::from_utf8(bytes)
                .map_err(|e| DbError::internal(format!("Table name is not valid UTF-8: {}", e)))
        }
    }
}

/// Wraps an executor so that nothing is changed on the server.
#[derive(Debug, Clone)]
pub struct DryRunExecutor<E> {
    inner: E,
}

impl<E> DryRunExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: SchemaExecutor + Sync> SchemaExecutor for DryRunExecutor<E> {
    async fn fetch_names(&self, sql: &str) -> DbResult<Vec<String>> {
        self.inner.fetch_names(sql).await
    }

    async fn execute(&self, sql: &str) -> DbResult<u64> {
        info!(sql = %sql, "Dry run, not executed");
        Ok(0)
    }
}

impl<E: SchemaExecutor + Sync> SchemaExecutor for &E {
    fn fetch_names(&self, sql: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send {
        (**self).fetch_names(sql)
    }

    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<u64>> + Send {
        (**self).execute(sql)
    }
}
