//! Migration job models.
//!
//! A job is described entirely by its source schema, destination schema,
//! table filter and copy ordering. It has no identity beyond one invocation.

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeSet;

/// Which source tables take part in a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "tables")]
pub enum TableFilter {
    /// Every table in the source schema.
    #[default]
    All,
    /// Only the named tables. Never empty; an empty list means `All`.
    Only(BTreeSet<String>),
}

impl TableFilter {
    /// Build a filter from repeated `-table` values.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if set.is_empty() {
            Self::All
        } else {
            Self::Only(set)
        }
    }

    /// Whether `table` is selected by this filter.
    pub fn selects(&self, table: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(table),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Filter entries that name none of `listed`.
    pub fn unmatched<'a>(&'a self, listed: &[String]) -> Vec<&'a str> {
        match self {
            Self::All => Vec::new(),
            Self::Only(names) => names
                .iter()
                .filter(|n| !listed.iter().any(|t| t == *n))
                .map(String::as_str)
                .collect(),
        }
    }
}

/// How structure and data copies are sequenced across tables.
///
/// The orderings differ only in what a partial failure leaves behind:
/// `Interleaved` leaves every table before the failing one fully copied,
/// `Phased` may leave already-created tables empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyOrdering {
    /// Structure then data for each table before moving to the next
    #[default]
    Interleaved,
    /// Structure for all tables, then data for all tables
    Phased,
}

impl std::fmt::Display for CopyOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interleaved => write!(f, "interleaved"),
            Self::Phased => write!(f, "phased"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationJob {
    pub source: String,
    pub destination: String,
    pub filter: TableFilter,
    pub ordering: CopyOrdering,
    /// List tables but only log the statements that would change anything.
    pub dry_run: bool,
}

impl MigrationJob {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            filter: TableFilter::All,
            ordering: CopyOrdering::default(),
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_ordering(mut self, ordering: CopyOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
