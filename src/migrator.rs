//! Schema migrator.
//!
//! Copies the tables of one schema into another on the same server:
//!
//! 1. list the source tables (`SHOW TABLES IN`)
//! 2. create the destination schema if it is missing
//! 3. for every table the filter selects, clone its structure
//!    (`CREATE TABLE ... LIKE`) and copy its rows (`INSERT ... SELECT *`)
//!
//! The first error stops the run. Nothing already created is rolled back, and
//! the returned report says how far the run got.

use crate::db::statements;
use crate::db::{DryRunExecutor, SchemaExecutor};
use crate::error::{MigrateError, MigrateResult, MigrationAborted};
use crate::models::{CopyOrdering, MigrationJob, MigrationReport};
use tracing::{debug, error, info, warn};

pub struct Migrator<E> {
    executor: E,
    job: MigrationJob,
    server_version: Option<String>,
}

impl<E: SchemaExecutor + Sync> Migrator<E> {
    pub fn new(executor: E, job: MigrationJob) -> Self {
        Self {
            executor,
            job,
            server_version: None,
        }
    }

    /// Record the server version in every report this migrator produces.
    pub fn with_server_version(mut self, version: Option<impl Into<String>>) -> Self {
        self.server_version = version.map(Into::into);
        self
    }

    pub fn job(&self) -> &MigrationJob {
        &self.job
    }

    /// Run the job to completion or to its first error.
    pub async fn run(&self) -> Result<MigrationReport, MigrationAborted> {
        let mut report = MigrationReport::new(&self.job);
        report.server_version = self.server_version.clone();

        info!(
            run_id = %report.run_id,
            from = %self.job.source,
            to = %self.job.destination,
            ordering = %self.job.ordering,
            dry_run = self.job.dry_run,
            "Starting schema migration"
        );

        let result = if self.job.dry_run {
            let dry = DryRunExecutor::new(&self.executor);
            self.run_steps(&dry, &mut report).await
        } else {
            self.run_steps(&self.executor, &mut report).await
        };

        match result {
            Ok(()) => {
                if self.job.dry_run {
                    let selected: Vec<String> =
                        report.tables.iter().map(|t| t.name.clone()).collect();
                    for table in &selected {
                        report.mark_planned(table);
                    }
                }
                report.finish(self.job.dry_run);
                info!(
                    run_id = %report.run_id,
                    status = %report.status,
                    tables = report.tables_copied().len(),
                    rows = report.rows_copied(),
                    duration_secs = report.duration_seconds,
                    "Finished migrating schema from {} to {}",
                    self.job.source,
                    self.job.destination
                );
                Ok(report)
            }
            Err(err) => {
                report.fail(&err);
                error!(
                    run_id = %report.run_id,
                    error = %err,
                    completed = ?report.tables_copied(),
                    "Migration aborted"
                );
                Err(MigrationAborted { error: err, report })
            }
        }
    }

    async fn run_steps<X: SchemaExecutor>(
        &self,
        executor: &X,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let job = &self.job;

        let listed = list_tables(executor, &job.source).await?;
        info!(schema = %job.source, count = listed.len(), "Listed source tables");

        report.unmatched_filter = job
            .filter
            .unmatched(&listed)
            .into_iter()
            .map(String::from)
            .collect();
        for name in &report.unmatched_filter {
            warn!(
                table = %name,
                schema = %job.source,
                "Requested table not found in source schema"
            );
        }

        let mut selected = Vec::new();
        for table in &listed {
            if job.filter.selects(table) {
                report.select(table);
                selected.push(table.as_str());
            } else {
                debug!(table = %table, "Skipping table not selected by filter");
                report.skip(table);
            }
        }
        report.tables_listed = listed.clone();

        create_schema(executor, &job.destination).await?;
        info!(schema = %job.destination, "Destination schema ready");

        match job.ordering {
            CopyOrdering::Interleaved => {
                for table in &selected {
                    self.copy_structure(executor, table, report).await?;
                    self.copy_data(executor, table, report).await?;
                }
            }
            CopyOrdering::Phased => {
                for table in &selected {
                    self.copy_structure(executor, table, report).await?;
                }
                for table in &selected {
                    self.copy_data(executor, table, report).await?;
                }
            }
        }

        Ok(())
    }

    async fn copy_structure<X: SchemaExecutor>(
        &self,
        executor: &X,
        table: &str,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let (from, to) = (&self.job.source, &self.job.destination);
        let sql = statements::create_table_like(from, to, table);
        executor
            .execute(&sql)
            .await
            .map_err(|e| MigrateError::copy_struct(table, from, to, e))?;
        debug!(table = %table, "Copied table structure");
        report.mark_structure_copied(table);
        Ok(())
    }

    async fn copy_data<X: SchemaExecutor>(
        &self,
        executor: &X,
        table: &str,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let (from, to) = (&self.job.source, &self.job.destination);
        let sql = statements::insert_select(from, to, table);
        let rows = executor
            .execute(&sql)
            .await
            .map_err(|e| MigrateError::copy_data(table, from, to, e))?;
        info!(table = %table, rows, "Copied table");
        report.mark_copied(table, rows);
        Ok(())
    }
}

/// All table names of `schema`, in the order the server lists them.
/// An empty schema is not an error.
pub async fn list_tables<X: SchemaExecutor>(
    executor: &X,
    schema: &str,
) -> MigrateResult<Vec<String>> {
    executor
        .fetch_names(&statements::show_tables(schema))
        .await
        .map_err(|e| MigrateError::list(schema, e))
}

/// Create `schema` unless it already exists.
pub async fn create_schema<X: SchemaExecutor>(executor: &X, schema: &str) -> MigrateResult<()> {
    executor
        .execute(&statements::create_database(schema))
        .await
        .map(|_| ())
        .map_err(|e| MigrateError::create_schema(schema, e))
}
