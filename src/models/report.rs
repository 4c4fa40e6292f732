//! Migration report.
//!
//! The report is filled in as the migrator works, so that an aborted run can
//! still tell the operator which tables made it across.

use crate::error::MigrateError;
use crate::models::{CopyOrdering, MigrationJob};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    DryRun,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}

/// The step a job was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStep {
    ListTables,
    CreateSchema,
    CopyStructure,
    CopyData,
}

impl std::fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListTables => write!(f, "list tables"),
            Self::CreateSchema => write!(f, "create schema"),
            Self::CopyStructure => write!(f, "copy structure"),
            Self::CopyData => write!(f, "copy data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    /// Selected but not attempted yet
    Pending,
    /// Created in the destination, still empty
    StructureCopied,
    /// Structure and rows copied
    Copied,
    /// Dry run only
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub name: String,
    pub state: TableState,
    pub rows_copied: u64,
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,
    pub status: RunStatus,
    pub source: String,
    pub destination: String,
    pub ordering: CopyOrdering,
    /// Version string of the server the run connected to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    /// Every table found in the source schema, in listing order.
    pub tables_listed: Vec<String>,
    /// Listed tables the filter did not select.
    pub tables_skipped: Vec<String>,
    /// Filter entries that named no table in the source schema.
    pub unmatched_filter: Vec<String>,
    /// Selected tables, in processing order.
    pub tables: Vec<TableReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<MigrationStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationReport {
    pub fn new(job: &MigrationJob) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: RunStatus::Running,
            source: job.source.clone(),
            destination: job.destination.clone(),
            ordering: job.ordering,
            server_version: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_seconds: 0.0,
            tables_listed: Vec::new(),
            tables_skipped: Vec::new(),
            unmatched_filter: Vec::new(),
            tables: Vec::new(),
            failed_step: None,
            failed_table: None,
            error: None,
        }
    }

    pub fn select(&mut self, table: &str) {
        self.tables.push(TableReport {
            name: table.to_string(),
            state: TableState::Pending,
            rows_copied: 0,
        });
    }

    pub fn skip(&mut self, table: &str) {
        self.tables_skipped.push(table.to_string());
    }

    pub fn mark_structure_copied(&mut self, table: &str) {
        if let Some(entry) = self.entry_mut(table) {
            entry.state = TableState::StructureCopied;
        }
    }

    pub fn mark_copied(&mut self, table: &str, rows: u64) {
        if let Some(entry) = self.entry_mut(table) {
            entry.state = TableState::Copied;
            entry.rows_copied = rows;
        }
    }

    pub fn mark_planned(&mut self, table: &str) {
        if let Some(entry) = self.entry_mut(table) {
            entry.state = TableState::Planned;
        }
    }

    fn entry_mut(&mut self, table: &str) -> Option<&mut TableReport> {
        self.tables.iter_mut().find(|t| t.name == table)
    }

    /// Close the report after every step ran.
    pub fn finish(&mut self, dry_run: bool) {
        self.status = if dry_run {
            RunStatus::DryRun
        } else {
            RunStatus::Succeeded
        };
        self.stamp_completion();
    }

    /// Close the report at the step that failed.
    pub fn fail(&mut self, error: &MigrateError) {
        self.status = RunStatus::Failed;
        self.failed_step = error.step();
        self.failed_table = error.table().map(String::from);
        self.error = Some(error.to_string());
        self.stamp_completion();
    }

    fn stamp_completion(&mut self) {
        let completed_at = Utc::now();
        self.duration_seconds =
            (completed_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.completed_at = Some(completed_at);
    }

    fn names_in(&self, state: TableState) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.state == state)
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Tables whose structure and rows were both copied.
    pub fn tables_copied(&self) -> Vec<&str> {
        self.names_in(TableState::Copied)
    }

    /// Tables created in the destination but left without rows.
    pub fn tables_empty(&self) -> Vec<&str> {
        self.names_in(TableState::StructureCopied)
    }

    /// Selected tables never attempted.
    pub fn tables_pending(&self) -> Vec<&str> {
        self.names_in(TableState::Pending)
    }

    pub fn rows_copied(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_copied).sum()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            RunStatus::DryRun => {
                writeln!(
                    f,
                    "Dry run: would migrate {} of {} tables from {} to {} ({})",
                    self.tables.len(),
                    self.tables_listed.len(),
                    self.source,
                    self.destination,
                    self.ordering
                )?;
                for table in &self.tables {
                    writeln!(f, "  {}", table.name)?;
                }
            }
            _ => {
                writeln!(
                    f,
                    "Migration {}: {} of {} selected tables copied from {} to {}, {} rows in {:.1}s",
                    self.status,
                    self.tables_copied().len(),
                    self.tables.len(),
                    self.source,
                    self.destination,
                    self.rows_copied(),
                    self.duration_seconds
                )?;
                for table in self.tables.iter().filter(|t| t.state == TableState::Copied) {
                    writeln!(f, "  copied  {} ({} rows)", table.name, table.rows_copied)?;
                }
                for name in self.tables_empty() {
                    writeln!(f, "  empty   {}", name)?;
                }
                if let (Some(step), Some(table)) = (self.failed_step, &self.failed_table) {
                    writeln!(f, "  failed  {} ({})", table, step)?;
                } else if let Some(step) = self.failed_step {
                    writeln!(f, "  failed  at {}", step)?;
                }
                for name in self.tables_pending() {
                    if Some(name) != self.failed_table.as_deref() {
                        writeln!(f, "  skipped {} (not attempted)", name)?;
                    }
                }
            }
        }
        if !self.tables_skipped.is_empty() {
            writeln!(f, "Not selected: {}", self.tables_skipped.join(", "))?;
        }
        if !self.unmatched_filter.is_empty() {
            writeln!(
                f,
                "Not found in {}: {}",
                self.source,
                self.unmatched_filter.join(", ")
            )?;
        }
        if let Some(version) = &self.server_version {
            writeln!(f, "Server version: {}", version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    fn report() -> MigrationReport {
        let mut report = MigrationReport::new(&MigrationJob::new("shop", "shop_bak"));
        report.tables_listed = vec!["users".into(), "orders".into(), "audit".into()];
        report.select("users");
        report.select("orders");
        report.skip("audit");
        report
    }

    #[test]
    fn test_new_report_is_running() {
        let report = report();
        assert_eq!(report.status, RunStatus::Running);
        assert!(report.completed_at.is_none());
        assert_eq!(report.tables_pending(), vec!["users", "orders"]);
        assert!(!report.run_id.is_empty());
    }

    #[test]
    fn test_success_counts_rows() {
        let mut report = report();
        report.mark_structure_copied("users");
        report.mark_copied("users", 2);
        report.mark_structure_copied("orders");
        report.mark_copied("orders", 0);
        report.finish(false);

        assert_eq!(report.status, RunStatus::Succeeded);
        assert_eq!(report.tables_copied(), vec!["users", "orders"]);
        assert_eq!(report.rows_copied(), 2);
        assert!(report.completed_at.is_some());
        let text = report.to_string();
        assert!(text.contains("2 of 2 selected tables"));
        assert!(text.contains("Not selected: audit"));
    }

    #[test]
    fn test_failure_keeps_partial_progress() {
        let mut report = report();
        report.mark_structure_copied("users");
        report.mark_copied("users", 2);
        report.fail(&MigrateError::copy_struct(
            "orders",
            "shop",
            "shop_bak",
            DbError::database("already exists", None),
        ));

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.tables_copied(), vec!["users"]);
        assert_eq!(report.failed_table.as_deref(), Some("orders"));
        let text = report.to_string();
        assert!(text.contains("copied  users (2 rows)"));
        assert!(text.contains("failed  orders (copy structure)"));
        assert!(!text.contains("skipped orders"));
    }

    #[test]
    fn test_json_shape() {
        let mut report = report();
        report.fail(&MigrateError::list("shop", DbError::database("denied", None)));
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failed_step"], "list_tables");
        assert_eq!(value["ordering"], "interleaved");
        assert!(value.get("failed_table").is_none());
        assert!(value.get("server_version").is_none());
        assert_eq!(value["tables"][0]["state"], "pending");
    }

    #[test]
    fn test_server_version_is_reported() {
        let mut report = report();
        report.server_version = Some("8.0.36".to_string());
        report.finish(false);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["server_version"], "8.0.36");
        assert!(report.to_string().contains("Server version: 8.0.36"));
    }

    #[test]
    fn test_dry_run_summary() {
        let mut report = report();
        report.mark_planned("users");
        report.mark_planned("orders");
        report.finish(true);
        assert_eq!(report.status, RunStatus::DryRun);
        assert!(report.to_string().starts_with("Dry run: would migrate 2 of 3 tables"));
    }
}
