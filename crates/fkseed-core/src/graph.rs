use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::adapter::Catalog;
use crate::error::{Error, Result};
use crate::rules::{MigrationOutcome, RuleStore};
use crate::schema::{ColumnDef, ForeignKeyRef};

/// Directed dependency: `child_table.child_column` references
/// `parent_table.parent_column`, so the parent row is inserted first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub parent_table: String,
    pub child_table: String,
    pub parent_column: String,
    pub child_column: String,
}

/// FK dependency graph over the tables reachable from the targets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    order: Vec<String>,
    edges: BTreeMap<String, Vec<Edge>>,
    in_degree: BTreeMap<String, usize>,
    #[serde(skip)]
    columns: BTreeMap<String, Vec<ColumnDef>>,
    #[serde(skip)]
    foreign_keys: BTreeMap<String, Vec<ForeignKeyRef>>,
}

impl DependencyGraph {
    /// Tables in the order they were discovered.
    pub fn tables(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, table: &str) -> bool {
        self.in_degree.contains_key(table)
    }

    /// Outgoing edges of `parent`, in discovery order.
    pub fn edges_from(&self, parent: &str) -> &[Edge] {
        self.edges.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn in_degree(&self, table: &str) -> usize {
        self.in_degree.get(table).copied().unwrap_or(0)
    }

    pub fn in_degrees(&self) -> &BTreeMap<String, usize> {
        &self.in_degree
    }

    /// Catalog columns captured when `table` was discovered.
    pub fn columns(&self, table: &str) -> &[ColumnDef] {
        self.columns.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Foreign keys of `table`, self-references excluded.
    pub fn foreign_keys(&self, table: &str) -> &[ForeignKeyRef] {
        self.foreign_keys
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Register a table with its catalog metadata. Discovery calls this once
    /// per visited table; embedders can use it to build graphs by hand.
    pub fn add_table(
        &mut self,
        table: &str,
        columns: Vec<ColumnDef>,
        foreign_keys: Vec<ForeignKeyRef>,
    ) {
        self.order.push(table.to_string());
        self.in_degree.entry(table.to_string()).or_insert(0);
        self.edges.entry(table.to_string()).or_default();
        self.columns.insert(table.to_string(), columns);
        self.foreign_keys.insert(table.to_string(), foreign_keys);
    }

    /// Record `edge` and count it against the child's in-degree.
    pub fn add_edge(&mut self, edge: Edge) {
        *self.in_degree.entry(edge.child_table.clone()).or_insert(0) += 1;
        self.edges
            .entry(edge.parent_table.clone())
            .or_default()
            .push(edge);
    }
}

/// Output of dependency discovery: the graph plus the migrated rules.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub graph: DependencyGraph,
    pub rules: RuleStore,
}

/// Result of linking one foreign key during discovery.
#[derive(Debug, Clone)]
pub struct EdgeStep {
    pub edge: Edge,
    pub outcome: MigrationOutcome,
    pub rules: RuleStore,
}

/// Build the edge for `child_table`'s foreign key and migrate any override on
/// the FK column onto the referenced parent column.
pub fn link_foreign_key(child_table: &str, fk: &ForeignKeyRef, mut rules: RuleStore) -> EdgeStep {
    let outcome = rules.migrate(
        child_table,
        &fk.child_column,
        &fk.parent_table,
        &fk.parent_column,
    );
    EdgeStep {
        edge: Edge {
            parent_table: fk.parent_table.clone(),
            child_table: child_table.to_string(),
            parent_column: fk.parent_column.clone(),
            child_column: fk.child_column.clone(),
        },
        outcome,
        rules,
    }
}

/// Push an override that landed on an already discovered table further up
/// its own FK chain, so no FK column keeps an override.
pub fn settle_override(
    graph: &DependencyGraph,
    table: &str,
    column: &str,
    mut rules: RuleStore,
) -> RuleStore {
    let mut table = table.to_string();
    let mut column = column.to_string();

    loop {
        let Some(fk) = graph
            .foreign_keys(&table)
            .iter()
            .find(|fk| fk.child_column == column)
            .cloned()
        else {
            return rules;
        };

        let step = link_foreign_key(&table, &fk, rules);
        rules = step.rules;
        log_migration(&step.edge, &step.outcome);
        if !matches!(step.outcome, MigrationOutcome::Moved { .. })
            || !graph.contains(&fk.parent_table)
        {
            return rules;
        }
        table = fk.parent_table;
        column = fk.parent_column;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

struct Frame {
    table: String,
    foreign_keys: Vec<ForeignKeyRef>,
    next: usize,
}

/// Walk FK constraints from `targets` up through every ancestor table,
/// migrating overrides onto the columns that produce them.
///
/// Traversal is depth-first in catalog order and visits each table once.
/// A foreign key pointing back to a table still on the current path is
/// rejected with [`Error::CyclicDependency`].
pub async fn discover<C>(catalog: &C, targets: &[String], rules: RuleStore) -> Result<Discovery>
where
    C: Catalog + ?Sized,
{
    if targets.is_empty() {
        return Err(Error::InvalidInput(
            "at least one target table is required".to_string(),
        ));
    }

    let mut graph = DependencyGraph::default();
    let mut rules = rules;
    let mut marks: HashMap<String, Mark> = HashMap::new();

    for target in targets {
        if marks.contains_key(target.as_str()) {
            continue;
        }

        let mut stack = vec![enter(catalog, &mut graph, &mut marks, target).await?];

        while let Some(frame) = stack.last_mut() {
            let Some(fk) = frame.foreign_keys.get(frame.next).cloned() else {
                if let Some(done) = stack.pop() {
                    marks.insert(done.table, Mark::Done);
                }
                continue;
            };
            frame.next += 1;
            let child = frame.table.clone();

            let step = link_foreign_key(&child, &fk, rules);
            rules = step.rules;
            log_migration(&step.edge, &step.outcome);
            let moved = matches!(step.outcome, MigrationOutcome::Moved { .. });
            graph.add_edge(step.edge);

            match marks.get(fk.parent_table.as_str()).copied() {
                None => {
                    let parent = enter(catalog, &mut graph, &mut marks, &fk.parent_table).await?;
                    stack.push(parent);
                }
                Some(Mark::InProgress) => {
                    let start = stack
                        .iter()
                        .position(|frame| frame.table == fk.parent_table)
                        .unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|frame| frame.table.clone()).collect();
                    cycle.push(fk.parent_table.clone());
                    return Err(Error::CyclicDependency { cycle });
                }
                Some(Mark::Done) => {
                    if moved {
                        rules = settle_override(
                            &graph,
                            &fk.parent_table,
                            &fk.parent_column,
                            rules,
                        );
                    }
                }
            }
        }
    }

    for table in rules.tables().filter(|table| !graph.contains(table)) {
        warn!(
            event = "rule_unused",
            table = %table,
            "override targets a table outside the dependency graph"
        );
    }

    debug!(
        event = "discovery_finished",
        tables = graph.tables().len(),
        edges = graph.edge_count()
    );

    Ok(Discovery { graph, rules })
}

async fn enter<C>(
    catalog: &C,
    graph: &mut DependencyGraph,
    marks: &mut HashMap<String, Mark>,
    table: &str,
) -> Result<Frame>
where
    C: Catalog + ?Sized,
{
    let columns = catalog.columns(table).await?;
    if columns.is_empty() {
        return Err(Error::UnknownTable(table.to_string()));
    }

    let mut foreign_keys = catalog.foreign_keys(table).await?;
    foreign_keys.retain(|fk| {
        let keep = fk.parent_table != table;
        if !keep {
            debug!(
                event = "self_reference_skipped",
                table = %table,
                column = %fk.child_column
            );
        }
        keep
    });

    debug!(
        event = "table_discovered",
        table = %table,
        columns = columns.len(),
        foreign_keys = foreign_keys.len()
    );

    graph.add_table(table, columns, foreign_keys.clone());
    marks.insert(table.to_string(), Mark::InProgress);

    Ok(Frame {
        table: table.to_string(),
        foreign_keys,
        next: 0,
    })
}

fn log_migration(edge: &Edge, outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::NoOverride => {}
        MigrationOutcome::Moved { value } => debug!(
            event = "rule_migrated",
            from = %format!("{}.{}", edge.child_table, edge.child_column),
            to = %format!("{}.{}", edge.parent_table, edge.parent_column),
            value = %value
        ),
        MigrationOutcome::Dropped { kept, discarded } => warn!(
            event = "rule_migration_dropped",
            from = %format!("{}.{}", edge.child_table, edge.child_column),
            to = %format!("{}.{}", edge.parent_table, edge.parent_column),
            kept = %kept,
            discarded = %discarded,
            "parent column already overridden"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use crate::rules::Rule;
    use crate::value::SeedValue;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn shop_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_table("customers", &[("id", "integer"), ("name", "text")])
            .with_table(
                "orders",
                &[("id", "integer"), ("customer_id", "integer")],
            )
            .with_table(
                "order_items",
                &[("id", "integer"), ("order_id", "integer")],
            )
            .with_table("payments", &[("id", "integer"), ("order_id", "integer")])
            .with_foreign_key("orders", "customer_id", "customers", "id")
            .with_foreign_key("order_items", "order_id", "orders", "id")
            .with_foreign_key("payments", "order_id", "orders", "id")
    }

    #[tokio::test]
    async fn discovers_ancestors_depth_first() {
        let catalog = shop_catalog();

        let discovery = discover(&catalog, &targets(&["order_items"]), RuleStore::new())
            .await
            .expect("discover");
        let graph = discovery.graph;

        assert_eq!(graph.tables(), ["order_items", "orders", "customers"]);
        assert_eq!(graph.in_degree("order_items"), 1);
        assert_eq!(graph.in_degree("orders"), 1);
        assert_eq!(graph.in_degree("customers"), 0);
        assert_eq!(graph.edges_from("orders")[0].child_table, "order_items");
        assert_eq!(graph.edge_count(), 2);
    }

    #[tokio::test]
    async fn shared_ancestors_are_fetched_once() {
        let catalog = shop_catalog();

        let discovery = discover(
            &catalog,
            &targets(&["order_items", "payments"]),
            RuleStore::new(),
        )
        .await
        .expect("discover");

        assert_eq!(catalog.fk_lookups("orders"), 1);
        assert_eq!(catalog.fk_lookups("customers"), 1);
        assert_eq!(discovery.graph.edges_from("orders").len(), 2);
    }

    #[tokio::test]
    async fn migrates_fk_override_onto_parent_column() {
        let catalog = shop_catalog();
        let rules = RuleStore::from_rules([Rule::new("payments", "order_id", "11")]);

        let discovery = discover(&catalog, &targets(&["payments"]), rules)
            .await
            .expect("discover");

        assert!(discovery.rules.get("payments", "order_id").is_none());
        assert_eq!(
            discovery.rules.get("orders", "id"),
            Some(&SeedValue::from("11"))
        );
    }

    #[tokio::test]
    async fn override_on_discovered_parent_follows_its_fk_chain() {
        let catalog = InMemoryCatalog::new()
            .with_table("users", &[("id", "integer")])
            .with_table("accounts", &[("user_id", "integer")])
            .with_table("sessions", &[("id", "integer"), ("account_user_id", "integer")])
            .with_foreign_key("accounts", "user_id", "users", "id")
            .with_foreign_key("sessions", "account_user_id", "accounts", "user_id");
        let rules = RuleStore::from_rules([Rule::new("sessions", "account_user_id", 5_i64)]);

        let discovery = discover(&catalog, &targets(&["accounts", "sessions"]), rules)
            .await
            .expect("discover");

        assert!(discovery.rules.get("accounts", "user_id").is_none());
        assert_eq!(discovery.rules.get("users", "id"), Some(&SeedValue::Int(5)));
    }

    #[tokio::test]
    async fn self_references_are_excluded() {
        let catalog = InMemoryCatalog::new()
            .with_table("employees", &[("id", "integer"), ("manager_id", "integer")])
            .with_foreign_key("employees", "manager_id", "employees", "id");

        let discovery = discover(&catalog, &targets(&["employees"]), RuleStore::new())
            .await
            .expect("discover");

        assert_eq!(discovery.graph.in_degree("employees"), 0);
        assert_eq!(discovery.graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn rejects_cycles() {
        let catalog = InMemoryCatalog::new()
            .with_table("a", &[("id", "integer"), ("b_id", "integer")])
            .with_table("b", &[("id", "integer"), ("a_id", "integer")])
            .with_foreign_key("a", "b_id", "b", "id")
            .with_foreign_key("b", "a_id", "a", "id");

        let err = discover(&catalog, &targets(&["a"]), RuleStore::new())
            .await
            .unwrap_err();

        match err {
            Error::CyclicDependency { cycle } => assert_eq!(cycle, ["a", "b", "a"]),
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[tokio::test]
    async fn unknown_table_is_fatal() {
        let catalog = shop_catalog();

        let err = discover(&catalog, &targets(&["missing"]), RuleStore::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownTable(table) if table == "missing"));
    }

    #[tokio::test]
    async fn empty_targets_are_rejected() {
        let catalog = shop_catalog();

        let err = discover(&catalog, &[], RuleStore::new()).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
