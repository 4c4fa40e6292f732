//! Database access layer.
//!
//! - Connection setup (one schema-less session per process)
//! - SQL statement construction with identifier quoting
//! - The executor seam between the migrator and the server

pub mod executor;
pub mod pool;
pub mod statements;

pub use executor::{DryRunExecutor, SchemaExecutor};
pub use pool::{ServerConnection, connect_options};
