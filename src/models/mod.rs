//! Data models for rms.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod job;
pub mod report;

// Re-export commonly used types
pub use connection::{
    ConnectionSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_PORT,
};
pub use job::{CopyOrdering, MigrationJob, TableFilter};
pub use report::{MigrationReport, MigrationStep, RunStatus, TableReport, TableState};
