//! rms - main entry point.
//!
//! Copies all tables of one schema into another schema on the same MySQL
//! server.

use clap::CommandFactory;
use rms::config::Config;
use rms::db::ServerConnection;
use rms::error::MigrateError;
use rms::migrator::Migrator;
use rms::models::MigrationReport;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging. Logs go to stderr so the
/// report on stdout stays machine-readable.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_report(report: &MigrationReport, as_json: bool) {
    if as_json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize report"),
        }
    } else {
        print!("{}", report);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse_args();

    // Validate before logging is set up or anything touches the network
    let job = match config.job() {
        Ok(job) => job,
        Err(e) => {
            println!("{}", e);
            println!();
            println!("{}", Config::command().render_usage());
            return ExitCode::from(2);
        }
    };

    init_tracing(&config);

    info!("RMS (Rename My Schema) Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = config.connection_settings();
    let connection = match ServerConnection::connect(&settings).await {
        Ok(connection) => connection,
        Err(e) => {
            let err = MigrateError::connection(settings.masked(), e);
            eprintln!("{}", err);
            if let Some(suggestion) = err.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            return ExitCode::FAILURE;
        }
    };

    let migrator =
        Migrator::new(&connection, job).with_server_version(connection.server_version());
    let outcome = migrator.run().await;
    connection.close().await;

    match outcome {
        Ok(report) => {
            print_report(&report, config.output_json);
            ExitCode::SUCCESS
        }
        Err(aborted) => {
            eprintln!(
                "Failed to migrate schema from {} to {}, {}",
                migrator.job().source,
                migrator.job().destination,
                aborted.error
            );
            if let Some(suggestion) = aborted.error.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            print_report(&aborted.report, config.output_json);
            ExitCode::FAILURE
        }
    }
}
