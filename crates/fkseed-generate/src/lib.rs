//! Row seeding engine for fkseed.
//!
//! Discovers the FK ancestry of the target tables, then inserts one row per
//! table in dependency order, propagating parent key values to dependents.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod inserter;
pub mod materializer;
pub mod model;

pub use engine::SeedEngine;
pub use errors::SeedError;
pub use generators::{ValueGenerator, generate_value};
pub use inserter::TopologicalInserter;
pub use materializer::{MaterializedRow, Provenance, RowMaterializer};
pub use model::{SeedOptions, SeedReport, TableReport};
