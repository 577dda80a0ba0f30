use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use fkseed_core::{Catalog, ColumnDef, ForeignKeyRef, Result, RowWriter, SeedValue};

use crate::options::PostgresOptions;

mod mapper;
mod queries;

pub use mapper::build_insert_sql;

/// Catalog lookups against `pg_catalog`.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
    options: PostgresOptions,
}

impl PostgresCatalog {
    /// Create a new catalog using a pre-configured pool.
    pub fn new(pool: PgPool, options: PostgresOptions) -> Self {
        Self { pool, options }
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnDef>> {
        let raw = queries::list_columns(&self.pool, &self.options.schema, table).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyRef>> {
        let raw =
            queries::list_foreign_key_columns(&self.pool, &self.options.schema, table).await?;
        for fk in &raw {
            debug!(
                event = "foreign_key_loaded",
                table = %table,
                constraint = %fk.constraint_name,
                parent = %fk.parent_table
            );
        }
        Ok(mapper::map_foreign_keys(raw))
    }
}

/// Executes parameterized single-row inserts.
#[derive(Debug, Clone)]
pub struct PostgresWriter {
    pool: PgPool,
    options: PostgresOptions,
}

impl PostgresWriter {
    pub fn new(pool: PgPool, options: PostgresOptions) -> Self {
        Self { pool, options }
    }
}

#[async_trait]
impl RowWriter for PostgresWriter {
    async fn insert_row(
        &self,
        table: &str,
        columns: &[ColumnDef],
        values: &[SeedValue],
    ) -> Result<()> {
        if columns.len() != values.len() {
            return Err(fkseed_core::Error::Other(format!(
                "{} columns but {} values for {table}",
                columns.len(),
                values.len()
            )));
        }

        let sql = mapper::build_insert_sql(&self.options.schema, table, columns);
        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.to_sql_text());
        }

        query
            .execute(&self.pool)
            .await
            .map_err(|err| fkseed_core::Error::Db(format!("insert into {table}: {err}")))?;
        Ok(())
    }
}
