use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::Rule;
use crate::value::SeedValue;

/// Seed file contract: which tables to seed and which literals to force.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeedPlan {
    /// Target tables, used as traversal entry points in order.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Literal overrides applied to the generated rows.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Seed for deterministic value generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Override as written in a seed file or on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSpec {
    pub table: String,
    pub column: String,
    /// Scalar literal; converted to the column's type at insert time.
    pub value: serde_json::Value,
}

impl SeedPlan {
    /// Append targets and rules from `other`; an explicit seed in `other` wins.
    pub fn merge(&mut self, other: SeedPlan) {
        for target in other.targets {
            if !self.targets.contains(&target) {
                self.targets.push(target);
            }
        }
        self.rules.extend(other.rules);
        if other.seed.is_some() {
            self.seed = other.seed;
        }
    }

    /// Convert rule specs into typed rules, in declaration order.
    pub fn rules(&self) -> Result<Vec<Rule>> {
        self.rules.iter().map(RuleSpec::to_rule).collect()
    }
}

impl RuleSpec {
    pub fn to_rule(&self) -> Result<Rule> {
        if self.table.trim().is_empty() || self.column.trim().is_empty() {
            return Err(Error::InvalidInput(
                "rules require both table and column".to_string(),
            ));
        }
        let value = SeedValue::from_json(&self.value).map_err(|reason| {
            Error::InvalidInput(format!(
                "rule {}.{}: {reason}",
                self.table, self.column
            ))
        })?;
        Ok(Rule::new(self.table.clone(), self.column.clone(), value))
    }
}

/// Parses `table.column=value`; the table part may itself contain dots.
impl FromStr for RuleSpec {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let (target, value) = input.split_once('=').ok_or_else(|| {
            Error::InvalidInput(format!("rule '{input}' must look like table.column=value"))
        })?;
        let (table, column) = target.trim().rsplit_once('.').ok_or_else(|| {
            Error::InvalidInput(format!("rule '{input}' is missing a column name"))
        })?;
        if table.is_empty() || column.is_empty() {
            return Err(Error::InvalidInput(format!(
                "rule '{input}' must name a table and a column"
            )));
        }
        Ok(RuleSpec {
            table: table.to_string(),
            column: column.to_string(),
            value: serde_json::Value::String(value.to_string()),
        })
    }
}
