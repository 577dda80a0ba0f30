use thiserror::Error;

/// Core error type shared across fkseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The catalog has no columns for the requested table.
    #[error("unknown table: {0}")]
    UnknownTable(String),
    /// Foreign keys form a cycle between the listed tables.
    #[error("cyclic foreign key dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    /// A value cannot be assigned to a column of the declared type.
    #[error("invalid value for {table}.{column} ({data_type}): {reason}")]
    InvalidValue {
        table: String,
        column: String,
        data_type: String,
        reason: String,
    },
    /// Caller input (targets, rules, seed file) is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by fkseed crates.
pub type Result<T> = std::result::Result<T, Error>;
