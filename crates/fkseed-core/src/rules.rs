use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::SeedValue;

/// Caller-declared literal override for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub table: String,
    pub column: String,
    pub value: SeedValue,
}

impl Rule {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<SeedValue>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Active override for a column of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Override {
    pub column: String,
    pub value: SeedValue,
}

/// Policy applied when two overrides compete for the same (table, column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The override registered first stays; later ones are discarded.
    #[default]
    FirstRegisteredWins,
}

impl TieBreak {
    /// Returns true when `incoming` should replace the existing override.
    pub fn replaces_existing(self) -> bool {
        match self {
            TieBreak::FirstRegisteredWins => false,
        }
    }
}

/// Result of moving an override from a dependent FK column to its parent column.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// The dependent column had no override.
    NoOverride,
    /// The override now lives on the parent column.
    Moved { value: SeedValue },
    /// The parent column already had an override; the migrated value was discarded.
    Dropped {
        kept: SeedValue,
        discarded: SeedValue,
    },
}

/// Overrides keyed by table, at most one per (table, column).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleStore {
    tables: BTreeMap<String, Vec<Override>>,
    #[serde(skip)]
    tie_break: TieBreak,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register rules in order; duplicates are resolved by the tie-break rule.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            if !store.install(&rule.table, &rule.column, rule.value.clone()) {
                tracing::warn!(
                    event = "rule_ignored",
                    table = %rule.table,
                    column = %rule.column,
                    value = %rule.value,
                    "duplicate override ignored"
                );
            }
        }
        store
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&SeedValue> {
        self.tables
            .get(table)?
            .iter()
            .find(|item| item.column == column)
            .map(|item| &item.value)
    }

    /// Snapshot of the overrides currently active for `table`.
    pub fn active_rules(&self, table: &str) -> Vec<(String, SeedValue)> {
        self.tables
            .get(table)
            .map(|overrides| {
                overrides
                    .iter()
                    .map(|item| (item.column.clone(), item.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|(_, overrides)| !overrides.is_empty())
            .map(|(table, _)| table.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|overrides| overrides.is_empty())
    }

    /// Move the override of `child_table.child_column` onto
    /// `parent_table.parent_column`.
    pub fn migrate(
        &mut self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> MigrationOutcome {
        let Some(value) = self.take(child_table, child_column) else {
            return MigrationOutcome::NoOverride;
        };

        if let Some(kept) = self.get(parent_table, parent_column).cloned() {
            if !self.tie_break.replaces_existing() {
                return MigrationOutcome::Dropped {
                    kept,
                    discarded: value,
                };
            }
        }

        self.put(parent_table, parent_column, value.clone());
        MigrationOutcome::Moved { value }
    }

    fn install(&mut self, table: &str, column: &str, value: SeedValue) -> bool {
        if self.get(table, column).is_some() && !self.tie_break.replaces_existing() {
            return false;
        }
        self.put(table, column, value);
        true
    }

    fn put(&mut self, table: &str, column: &str, value: SeedValue) {
        let overrides = self.tables.entry(table.to_string()).or_default();
        match overrides.iter_mut().find(|item| item.column == column) {
            Some(existing) => existing.value = value,
            None => overrides.push(Override {
                column: column.to_string(),
                value,
            }),
        }
    }

    fn take(&mut self, table: &str, column: &str) -> Option<SeedValue> {
        let overrides = self.tables.get_mut(table)?;
        let idx = overrides.iter().position(|item| item.column == column)?;
        Some(overrides.remove(idx).value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_moves_override_to_parent_column() {
        let mut store = RuleStore::from_rules([Rule::new("payments", "order_id", "11")]);

        let outcome = store.migrate("payments", "order_id", "orders", "id");

        assert_eq!(
            outcome,
            MigrationOutcome::Moved {
                value: SeedValue::from("11")
            }
        );
        assert!(store.get("payments", "order_id").is_none());
        assert_eq!(store.get("orders", "id"), Some(&SeedValue::from("11")));
        assert!(store.active_rules("payments").is_empty());
    }

    #[test]
    fn migrate_without_override_is_noop() {
        let mut store = RuleStore::from_rules([Rule::new("orders", "status", "paid")]);
        let before = store.clone();

        let outcome = store.migrate("payments", "order_id", "orders", "id");

        assert_eq!(outcome, MigrationOutcome::NoOverride);
        assert_eq!(store, before);
    }

    #[test]
    fn first_registered_wins_when_parent_already_overridden() {
        let mut store = RuleStore::from_rules([
            Rule::new("orders", "id", "7"),
            Rule::new("payments", "order_id", "11"),
        ]);
        assert_eq!(store.tie_break(), TieBreak::FirstRegisteredWins);

        let outcome = store.migrate("payments", "order_id", "orders", "id");

        assert_eq!(
            outcome,
            MigrationOutcome::Dropped {
                kept: SeedValue::from("7"),
                discarded: SeedValue::from("11"),
            }
        );
        assert_eq!(store.get("orders", "id"), Some(&SeedValue::from("7")));
        assert!(store.get("payments", "order_id").is_none());
    }

    #[test]
    fn second_migration_to_same_parent_column_is_dropped() {
        let mut store = RuleStore::from_rules([
            Rule::new("payments", "order_id", "11"),
            Rule::new("shipments", "order_id", "12"),
        ]);

        store.migrate("payments", "order_id", "orders", "id");
        let outcome = store.migrate("shipments", "order_id", "orders", "id");

        assert!(matches!(outcome, MigrationOutcome::Dropped { .. }));
        assert_eq!(store.active_rules("orders").len(), 1);
        assert_eq!(store.get("orders", "id"), Some(&SeedValue::from("11")));
    }

    #[test]
    fn duplicate_rules_keep_the_first() {
        let store = RuleStore::from_rules([
            Rule::new("orders", "id", 1_i64),
            Rule::new("orders", "id", 2_i64),
        ]);

        assert_eq!(
            store.active_rules("orders"),
            vec![("id".to_string(), SeedValue::Int(1))]
        );
    }
}
