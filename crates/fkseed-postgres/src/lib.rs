//! PostgreSQL catalog and row writer for fkseed.

pub mod options;
pub mod postgres;

pub use options::PostgresOptions;
pub use postgres::{PostgresCatalog, PostgresWriter};
