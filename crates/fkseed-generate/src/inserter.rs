use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{info, warn};

use fkseed_core::{DependencyGraph, RowWriter, SeedValue};

use crate::errors::SeedError;
use crate::materializer::{MaterializedRow, RowMaterializer};

/// Inserts one row per table of a [`DependencyGraph`], parents first.
///
/// Tables become ready when every FK edge pointing into them has been
/// satisfied by an inserted parent; ready tables are processed in FIFO order.
pub struct TopologicalInserter<'a, W: RowWriter + ?Sized> {
    materializer: RowMaterializer<'a, W>,
}

impl<'a, W: RowWriter + ?Sized> TopologicalInserter<'a, W> {
    pub fn new(materializer: RowMaterializer<'a, W>) -> Self {
        Self { materializer }
    }

    /// Insert every table of `graph`, returning rows in insertion order.
    ///
    /// Rows inserted before a failure are left in place.
    pub async fn run(&self, graph: &DependencyGraph) -> Result<Vec<MaterializedRow>, SeedError> {
        let mut in_degree: HashMap<&str, usize> = graph
            .in_degrees()
            .iter()
            .map(|(table, degree)| (table.as_str(), *degree))
            .collect();
        let mut inherited: HashMap<String, BTreeMap<String, SeedValue>> = HashMap::new();
        let mut queue: VecDeque<&str> = graph
            .tables()
            .iter()
            .map(String::as_str)
            .filter(|table| graph.in_degree(table) == 0)
            .collect();
        let mut rows: Vec<MaterializedRow> = Vec::with_capacity(graph.tables().len());

        while let Some(table) = queue.pop_front() {
            let values = inherited.remove(table).unwrap_or_default();
            let row = self
                .materializer
                .materialize(table, graph.columns(table), &values)
                .await
                .map_err(|source| SeedError::InsertFailed {
                    table: table.to_string(),
                    inserted: rows.iter().map(|row| row.table.clone()).collect(),
                    source,
                })?;

            for edge in graph.edges_from(table) {
                match row.value(&edge.parent_column) {
                    Some(value) => {
                        inherited
                            .entry(edge.child_table.clone())
                            .or_default()
                            .insert(edge.child_column.clone(), value.clone());
                    }
                    None => warn!(
                        event = "parent_column_missing",
                        table = %table,
                        column = %edge.parent_column,
                        child = %edge.child_table,
                        "referenced column not present in parent row"
                    ),
                }

                if let Some(degree) = in_degree.get_mut(edge.child_table.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(edge.child_table.as_str());
                    }
                }
            }

            info!(event = "table_seeded", table = %table);
            rows.push(row);
        }

        let stranded: Vec<String> = graph
            .tables()
            .iter()
            .filter(|table| in_degree.get(table.as_str()).copied().unwrap_or(0) > 0)
            .cloned()
            .collect();
        if !stranded.is_empty() {
            return Err(SeedError::StrandedTables(stranded));
        }

        Ok(rows)
    }
}
