//! Error types for rms.
//!
//! `DbError` describes a single failed round-trip to the server. `MigrateError`
//! wraps it with the migration step and the objects involved, so the operator
//! can see which schema or table to clean up before re-running.

use crate::models::{MigrationReport, MigrationStep};
use thiserror::Error;

/// A failure reported by the database driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("{}", format_database_message(.message, .sql_state.as_deref()))]
    Database {
        message: String,
        /// e.g. "42S01" for table already exists
        sql_state: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// SQLSTATE MySQL reports for ER_TABLE_EXISTS_ERROR.
const TABLE_EXISTS: &str = "42S01";

fn format_database_message(message: &str, sql_state: Option<&str>) -> String {
    match sql_state {
        Some(code) => format!("{} (SQLSTATE: {})", message, code),
        None => message.to_string(),
    }
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the host, port and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for the server connection",
                "Increase --connect-timeout or check that the server is reachable",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Re-run the migration")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for single database round-trips.
pub type DbResult<T> = Result<T, DbError>;

/// Terminal errors of a migration run. None of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrateError {
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: DbError,
    },

    #[error("please specify -{flag}")]
    FlagValidation { flag: String },

    #[error("Failed to list tables in {schema}: {source}")]
    List {
        schema: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to create database {schema}: {source}")]
    CreateSchema {
        schema: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to copy table structure of {table} from {from} to {to}: {source}")]
    CopyStruct {
        table: String,
        from: String,
        to: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to copy table data of {table} from {from} to {to}: {source}")]
    CopyData {
        table: String,
        from: String,
        to: String,
        #[source]
        source: DbError,
    },
}

impl MigrateError {
    pub fn connection(target: impl Into<String>, source: DbError) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }

    pub fn flag_validation(flag: impl Into<String>) -> Self {
        Self::FlagValidation { flag: flag.into() }
    }

    pub fn list(schema: impl Into<String>, source: DbError) -> Self {
        Self::List {
            schema: schema.into(),
            source,
        }
    }

    pub fn create_schema(schema: impl Into<String>, source: DbError) -> Self {
        Self::CreateSchema {
            schema: schema.into(),
            source,
        }
    }

    pub fn copy_struct(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        source: DbError,
    ) -> Self {
        Self::CopyStruct {
            table: table.into(),
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    pub fn copy_data(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        source: DbError,
    ) -> Self {
        Self::CopyData {
            table: table.into(),
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Table the run stopped at, for the per-table steps.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::CopyStruct { table, .. } | Self::CopyData { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Migration step the error belongs to. `None` for errors raised before
    /// the job starts.
    pub fn step(&self) -> Option<MigrationStep> {
        match self {
            Self::Connection { .. } | Self::FlagValidation { .. } => None,
            Self::List { .. } => Some(MigrationStep::ListTables),
            Self::CreateSchema { .. } => Some(MigrationStep::CreateSchema),
            Self::CopyStruct { .. } => Some(MigrationStep::CopyStructure),
            Self::CopyData { .. } => Some(MigrationStep::CopyData),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { source, .. } => source.suggestion(),
            Self::FlagValidation { .. } => Some("Both -from and -to are required"),
            Self::CopyStruct { source, .. } if source.sql_state() == Some(TABLE_EXISTS) => Some(
                "Drop the table from the destination schema or exclude it with -table before re-running",
            ),
            _ => None,
        }
    }
}

/// A migration that stopped at its first error, together with what it had done
/// up to that point.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct MigrationAborted {
    #[source]
    pub error: MigrateError,
    pub report: MigrationReport,
}

pub type MigrateResult<T> = Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_database_error_includes_sql_state() {
        let err = DbError::database("Table 'orders' already exists", Some("42S01".to_string()));
        assert_eq!(
            err.to_string(),
            "Table 'orders' already exists (SQLSTATE: 42S01)"
        );
        assert_eq!(err.sql_state(), Some("42S01"));
    }

    #[test]
    fn test_database_error_without_sql_state() {
        let err = DbError::database("gone away", None);
        assert_eq!(err.to_string(), "gone away");
        assert_eq!(err.sql_state(), None);
    }

    #[test]
    fn test_flag_validation_message() {
        let err = MigrateError::flag_validation("from");
        assert_eq!(err.to_string(), "please specify -from");
        assert_eq!(err.step(), None);
    }

    #[test]
    fn test_copy_struct_names_table_and_schemas() {
        let err = MigrateError::copy_struct(
            "orders",
            "shop",
            "shop_bak",
            DbError::database("already exists", Some("42S01".to_string())),
        );
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("shop"));
        assert!(msg.contains("shop_bak"));
        assert_eq!(err.table(), Some("orders"));
        assert_eq!(err.step(), Some(MigrationStep::CopyStructure));
        assert!(err.suggestion().unwrap().contains("Drop the table"));
    }

    #[test]
    fn test_copy_struct_hint_only_for_existing_table() {
        let err = MigrateError::copy_struct(
            "orders",
            "shop",
            "shop_bak",
            DbError::database("SELECT command denied", Some("42000".to_string())),
        );
        assert_eq!(err.suggestion(), None);

        let err = MigrateError::copy_struct("orders", "shop", "shop_bak", DbError::internal("x"));
        assert_eq!(err.suggestion(), None);
    }

    #[test]
    fn test_copy_data_reports_table() {
        let err = MigrateError::copy_data("users", "a", "b", DbError::internal("boom"));
        assert!(err.to_string().starts_with("Failed to copy table data of users"));
        assert_eq!(err.table(), Some("users"));
    }

    #[test]
    fn test_schema_level_errors_have_no_table() {
        let err = MigrateError::list("shop", DbError::internal("x"));
        assert_eq!(err.table(), None);
        let err = MigrateError::create_schema("shop_bak", DbError::internal("x"));
        assert_eq!(err.table(), None);
    }

    #[test]
    fn test_connection_suggestion_is_forwarded() {
        let err = MigrateError::connection(
            "localhost:3306",
            DbError::connection("refused", "Check network connectivity"),
        );
        assert_eq!(err.suggestion(), Some("Check network connectivity"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err = MigrateError::list("shop", DbError::database("Unknown database 'shop'", None));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Unknown database 'shop'"));
    }
}
