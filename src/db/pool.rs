//! Server connection.
//!
//! rms holds exactly one connection for the lifetime of the process. It is
//! kept in a sqlx pool capped at one connection, so every statement runs on
//! the same session, one after another.

use crate::error::{DbError, DbResult};
use crate::models::ConnectionSettings;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The single connection a migration runs on.
#[derive(Debug, Clone)]
pub struct ServerConnection {
    pool: MySqlPool,
    server_version: Option<String>,
}

impl ServerConnection {
    /// Connect without selecting a default schema.
    pub async fn connect(settings: &ConnectionSettings) -> DbResult<Self> {
        info!(target_server = %settings.masked(), "Connecting to database server");
        Self::connect_with(connect_options(settings), settings.connect_timeout).await
    }

    /// Connect with prepared options (e.g. parsed from a URL).
    pub async fn connect_with(
        options: MySqlConnectOptions,
        connect_timeout: Duration,
    ) -> DbResult<Self> {
        let pool = MySqlPoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(false)
            .connect_with(options.charset("utf8mb4"))
            .await
            .map_err(|e| {
                let suggestion = connection_suggestion(&e);
                DbError::connection(format!("Failed to connect: {}", e), suggestion)
            })?;

        let server_version = get_server_version(&pool).await;
        info!(server_version = ?server_version, "Connected successfully");

        Ok(Self {
            pool,
            server_version,
        })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// `SELECT version()` as reported when the connection was opened.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Build driver options from the operator's settings.
///
/// The user is always sent, so an empty `-user` logs in as the anonymous
/// user rather than the driver's `root` default. An empty password is not sent.
pub fn connect_options(settings: &ConnectionSettings) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user);
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    options
}

async fn get_server_version(pool: &MySqlPool) -> Option<String> {
    match sqlx::query_scalar::<_, String>("SELECT version()")
        .fetch_one(pool)
        .await
    {
        Ok(version) => {
            debug!(version = %version, "Got server version");
            Some(version)
        }
        Err(e) => {
            warn!(error = %e, "Failed to get server version");
            None
        }
    }
}

fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and accessible on -host/-port".to_string();
    }

    if error_str.contains("access denied")
        || error_str.contains("authentication")
        || error_str.contains("password")
    {
        return "Verify the -user and -password flags".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    if matches!(error, sqlx::Error::PoolTimedOut) {
        return "The server did not answer in time; increase --connect-timeout".to_string();
    }

    "Verify -host, -port, -user and -password".to_string()
}
