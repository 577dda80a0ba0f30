use thiserror::Error;

/// Errors emitted while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Core(#[from] fkseed_core::Error),
    /// Inserting into `table` failed; rows listed in `inserted` stay in place.
    #[error("seeding {table} failed after inserting [{}]: {source}", .inserted.join(", "))]
    InsertFailed {
        table: String,
        inserted: Vec<String>,
        #[source]
        source: fkseed_core::Error,
    },
    /// Tables whose in-degree never reached zero, so they were never inserted.
    #[error("tables never became ready for insertion: {}", .0.join(", "))]
    StrandedTables(Vec<String>),
}
