//! In-memory catalog and writer, used by tests and embedders that seed
//! from a schema description instead of a live database.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapter::{Catalog, RowWriter};
use crate::error::{Error, Result};
use crate::schema::{ColumnDef, ForeignKeyRef};
use crate::value::SeedValue;

#[derive(Debug, Clone, Default)]
struct TableDef {
    columns: Vec<ColumnDef>,
    foreign_keys: Vec<ForeignKeyRef>,
}

/// Catalog backed by table definitions registered up front.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: BTreeMap<String, TableDef>,
    fk_lookups: Mutex<BTreeMap<String, usize>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with `(name, data_type)` columns in order.
    pub fn with_table(mut self, table: &str, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(idx, (name, data_type))| ColumnDef::new(idx as i16 + 1, *name, *data_type))
            .collect();
        self.tables.entry(table.to_string()).or_default().columns = columns;
        self
    }

    /// Declare that `child.child_column` references `parent.parent_column`.
    pub fn with_foreign_key(
        mut self,
        child: &str,
        child_column: &str,
        parent: &str,
        parent_column: &str,
    ) -> Self {
        self.tables
            .entry(child.to_string())
            .or_default()
            .foreign_keys
            .push(ForeignKeyRef::new(parent, parent_column, child_column));
        self
    }

    /// Number of foreign key lookups served for `table`.
    pub fn fk_lookups(&self, table: &str) -> usize {
        self.fk_lookups
            .lock()
            .map(|lookups| lookups.get(table).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnDef>> {
        Ok(self
            .tables
            .get(table)
            .map(|def| def.columns.clone())
            .unwrap_or_default())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyRef>> {
        {
            let mut lookups = self
                .fk_lookups
                .lock()
                .map_err(|_| Error::Other("catalog lookup counter poisoned".to_string()))?;
            *lookups.entry(table.to_string()).or_insert(0) += 1;
        }

        Ok(self
            .tables
            .get(table)
            .map(|def| def.foreign_keys.clone())
            .unwrap_or_default())
    }
}

/// A row captured by [`InMemoryWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedRow {
    pub table: String,
    pub values: BTreeMap<String, SeedValue>,
}

/// Writer that records rows instead of executing SQL.
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    rows: Mutex<Vec<InsertedRow>>,
    failing_table: Option<String>,
}

impl InMemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts into `table`, emulating a constraint violation.
    pub fn failing_on(table: &str) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            failing_table: Some(table.to_string()),
        }
    }

    pub fn rows(&self) -> Vec<InsertedRow> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Tables in the order their rows were written.
    pub fn insertion_order(&self) -> Vec<String> {
        self.rows().into_iter().map(|row| row.table).collect()
    }

    pub fn row(&self, table: &str) -> Option<InsertedRow> {
        self.rows().into_iter().find(|row| row.table == table)
    }
}

#[async_trait]
impl RowWriter for InMemoryWriter {
    async fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDef],
        values: &[SeedValue],
    ) -> Result<()> {
        if self.failing_table.as_deref() == Some(table) {
            return Err(Error::Db(format!("insert into {table} rejected")));
        }
        if columns.len() != values.len() {
            return Err(Error::Other(format!(
                "{} columns but {} values for {table}",
                columns.len(),
                values.len()
            )));
        }

        let values = columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.name.clone(), value.clone()))
            .collect();
        self.rows
            .lock()
            .map_err(|_| Error::Other("writer row buffer poisoned".to_string()))?
            .push(InsertedRow {
                table: table.to_string(),
                values,
            });
        Ok(())
    }
}
