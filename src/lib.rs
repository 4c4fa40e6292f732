//! rms (Rename My Schema) library.
//!
//! Copies every table (structure and rows) of one MySQL schema into another
//! schema on the same server, optionally restricted to a set of tables.

pub mod config;
pub mod db;
pub mod error;
pub mod migrator;
pub mod models;

pub use config::Config;
pub use error::{DbError, MigrateError, MigrationAborted};
pub use migrator::Migrator;
pub use models::{CopyOrdering, MigrationJob, MigrationReport, TableFilter};
