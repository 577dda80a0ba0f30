/// Options shared by the Postgres catalog and writer.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// Namespace holding the seeded tables; table names are unqualified within it.
    pub schema: String,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
        }
    }
}
