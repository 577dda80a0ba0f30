//! Core contracts for fkseed.
//!
//! This crate defines the value model, catalog metadata, override rules and
//! the FK dependency discovery shared by the Postgres adapter, the seeding
//! engine and the CLI.

pub mod adapter;
pub mod error;
pub mod graph;
pub mod memory;
pub mod plan;
pub mod redaction;
pub mod rules;
pub mod schema;
pub mod value;

pub use adapter::{Catalog, RowWriter};
pub use error::{Error, Result};
pub use graph::{
    DependencyGraph, Discovery, Edge, EdgeStep, discover, link_foreign_key, settle_override,
};
pub use memory::{InMemoryCatalog, InMemoryWriter, InsertedRow};
pub use plan::{RuleSpec, SeedPlan};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use rules::{MigrationOutcome, Override, Rule, RuleStore, TieBreak};
pub use schema::{ColumnDef, DeclaredType, ForeignKeyRef};
pub use value::SeedValue;
