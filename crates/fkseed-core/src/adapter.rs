use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ColumnDef, ForeignKeyRef};
use crate::value::SeedValue;

/// Catalog lookups needed to discover FK dependencies and populate rows.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Columns to populate for `table`, in catalog order.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnDef>>;

    /// Foreign keys where `table` is the dependent side. Self-references are
    /// included; callers decide whether to keep them.
    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyRef>>;
}

/// Executes single-row inserts against the target database.
#[async_trait]
pub trait RowWriter: Send + Sync {
    /// Insert one row; `values` are aligned with `columns`.
    async fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDef],
        values: &[SeedValue],
    ) -> Result<()>;
}
