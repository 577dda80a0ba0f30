use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use fkseed_core::{RuleStore, SeedValue};

use crate::materializer::{MaterializedRow, Provenance};

/// Options for the seeding engine.
#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// Identifier recorded in logs and the report; generated when absent.
    pub run_id: Option<String>,
    /// Seed for value generation; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Reference instant for temporal values; defaults to the current UTC time.
    pub now: Option<NaiveDateTime>,
}

/// Values written to one table and where each came from.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,
    pub overridden: usize,
    pub inherited: usize,
    pub generated: usize,
    pub values: BTreeMap<String, SeedValue>,
}

impl TableReport {
    pub fn from_row(row: &MaterializedRow) -> Self {
        let count = |kind: Provenance| {
            row.provenance
                .values()
                .filter(|provenance| **provenance == kind)
                .count()
        };
        Self {
            table: row.table.clone(),
            overridden: count(Provenance::Override),
            inherited: count(Provenance::Inherited),
            generated: count(Provenance::Generated),
            values: row.values.clone(),
        }
    }
}

/// Summary of a seeding run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub run_id: String,
    pub seed: u64,
    pub insertion_order: Vec<String>,
    pub tables: Vec<TableReport>,
    /// Overrides in effect after migration.
    pub rules: RuleStore,
    pub duration_ms: u64,
}

impl SeedReport {
    pub fn table(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table == table)
    }
}
