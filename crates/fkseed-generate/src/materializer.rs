use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use fkseed_core::{ColumnDef, Error, Result, RowWriter, RuleStore, SeedValue};

use crate::generators::ValueGenerator;

/// Where a column value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Override,
    Inherited,
    Generated,
}

/// A fully populated row.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRow {
    pub table: String,
    pub values: BTreeMap<String, SeedValue>,
    pub provenance: BTreeMap<String, Provenance>,
}

impl MaterializedRow {
    pub fn value(&self, column: &str) -> Option<&SeedValue> {
        self.values.get(column)
    }
}

/// Builds one row per table and hands it to a [`RowWriter`].
///
/// For each column the active override wins, then a value inherited from a
/// parent row, then a generated value.
pub struct RowMaterializer<'a, W: RowWriter + ?Sized> {
    writer: &'a W,
    rules: &'a RuleStore,
    seed: u64,
    now: NaiveDateTime,
}

impl<'a, W: RowWriter + ?Sized> RowMaterializer<'a, W> {
    pub fn new(writer: &'a W, rules: &'a RuleStore, seed: u64, now: NaiveDateTime) -> Self {
        Self {
            writer,
            rules,
            seed,
            now,
        }
    }

    /// Choose the value of every column without touching the database.
    pub fn resolve(
        &self,
        table: &str,
        columns: &[ColumnDef],
        inherited: &BTreeMap<String, SeedValue>,
    ) -> Result<MaterializedRow> {
        let mut generator = ValueGenerator::for_table(self.seed, table, self.now);
        let mut values = BTreeMap::new();
        let mut provenance = BTreeMap::new();

        for column in columns {
            let declared = column.declared_type();
            let (value, source) = if let Some(value) = self.rules.get(table, &column.name) {
                (assign(table, column, value)?, Provenance::Override)
            } else if let Some(value) = inherited.get(&column.name) {
                (assign(table, column, value)?, Provenance::Inherited)
            } else {
                (generator.generate(&declared), Provenance::Generated)
            };
            values.insert(column.name.clone(), value);
            provenance.insert(column.name.clone(), source);
        }

        Ok(MaterializedRow {
            table: table.to_string(),
            values,
            provenance,
        })
    }

    /// Resolve and insert the row for `table`.
    pub async fn materialize(
        &self,
        table: &str,
        columns: &[ColumnDef],
        inherited: &BTreeMap<String, SeedValue>,
    ) -> Result<MaterializedRow> {
        let row = self.resolve(table, columns, inherited)?;
        let ordered: Vec<SeedValue> = columns
            .iter()
            .map(|column| row.values.get(&column.name).cloned().unwrap_or(SeedValue::Null))
            .collect();

        self.writer.insert_row(table, columns, &ordered).await?;

        debug!(
            event = "row_inserted",
            table = %table,
            columns = columns.len(),
            overridden = row
                .provenance
                .values()
                .filter(|source| **source == Provenance::Override)
                .count()
        );
        Ok(row)
    }
}

fn assign(table: &str, column: &ColumnDef, value: &SeedValue) -> Result<SeedValue> {
    value
        .assign(&column.declared_type())
        .map_err(|reason| Error::InvalidValue {
            table: table.to_string(),
            column: column.name.clone(),
            data_type: column.data_type.clone(),
            reason,
        })
}
