//! Configuration handling for rms.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables. Flags may be spelled with one dash (`-from shop`)
//! as well as two (`--from shop`).

use crate::error::{MigrateError, MigrateResult};
use crate::models::{
    ConnectionSettings, CopyOrdering, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_PORT,
    MigrationJob, TableFilter,
};
use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Long flags that are also accepted with a single leading dash.
const LEGACY_FLAGS: &[&str] = &[
    "host",
    "user",
    "password",
    "port",
    "from",
    "to",
    "table",
    "ordering",
    "dry-run",
    "output-json",
    "connect-timeout",
    "log-level",
    "json-logs",
    "help",
    "version",
];

/// Flags whose value is the next argument unless given as `-name=value`.
const VALUE_FLAGS: &[&str] = &[
    "host",
    "user",
    "password",
    "port",
    "from",
    "to",
    "table",
    "ordering",
    "connect-timeout",
    "log-level",
];

/// Configuration for a single rms run.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rms",
    about = "RMS (Rename My Schema) - copy every table of a schema into another schema on the same server",
    version
)]
pub struct Config {
    /// Database server host
    #[arg(long, default_value = DEFAULT_HOST, env = "RMS_HOST", allow_hyphen_values = true)]
    pub host: String,

    /// Username
    #[arg(long, default_value = "", env = "RMS_USER", allow_hyphen_values = true)]
    pub user: String,

    /// Password
    #[arg(
        long,
        default_value = "",
        env = "RMS_PASSWORD",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    pub password: String,

    /// Database server port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "RMS_PORT")]
    pub port: u16,

    /// Source schema name (required)
    #[arg(long, value_name = "SCHEMA", allow_hyphen_values = true)]
    pub from: Option<String>,

    /// Destination schema name (required)
    #[arg(long, value_name = "SCHEMA", allow_hyphen_values = true)]
    pub to: Option<String>,

    /// Table to be migrated. Can be specified multiple times; all tables when absent.
    #[arg(long = "table", value_name = "TABLE", allow_hyphen_values = true)]
    pub tables: Vec<String>,

    /// Copy ordering across tables
    #[arg(long, value_enum, default_value_t = CopyOrdering::Interleaved, env = "RMS_ORDERING")]
    pub ordering: CopyOrdering,

    /// List the source tables and log the statements without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the migration report as JSON to stdout
    #[arg(long)]
    pub output_json: bool,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "RMS_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "RMS_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "RMS_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Like [`Config::parse_args`], for explicit argument lists.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Check that both schemas were given. Runs before any connection attempt.
    pub fn validate(&self) -> MigrateResult<()> {
        require("from", self.from.as_deref())?;
        require("to", self.to.as_deref())?;
        Ok(())
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings::new(&self.host, self.port, &self.user, &self.password)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
    }

    /// Build the migration job. Validates first.
    pub fn job(&self) -> MigrateResult<MigrationJob> {
        self.validate()?;
        let source = self.from.clone().unwrap_or_default();
        let destination = self.to.clone().unwrap_or_default();
        Ok(MigrationJob::new(source, destination)
            .with_filter(TableFilter::from_names(self.tables.iter().cloned()))
            .with_ordering(self.ordering)
            .with_dry_run(self.dry_run))
    }
}

fn require(flag: &str, value: Option<&str>) -> MigrateResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(MigrateError::flag_validation(flag)),
    }
}

/// Rewrite `-name` / `-name=value` into `--name` / `--name=value` for every
/// known long flag in flag position. The token after a value-taking flag is
/// its value and is never rewritten. Everything after a bare `--` is left
/// alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    let mut expects_value = false;

    while let Some(arg) = args.next() {
        if expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };
        if text == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }
        match text.strip_prefix("--").or_else(|| text.strip_prefix('-')) {
            Some(name) if is_legacy_flag(name) => {
                expects_value = VALUE_FLAGS.contains(&name);
                if text.starts_with("--") {
                    normalized.push(arg);
                } else {
                    normalized.push(OsString::from(format!("-{}", text)));
                }
            }
            _ => normalized.push(arg),
        }
    }
    normalized
}

fn is_legacy_flag(arg: &str) -> bool {
    let name = arg.split_once('=').map_or(arg, |(name, _)| name);
    LEGACY_FLAGS.contains(&name)
}
