//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The connection string is missing or cannot be parsed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A query template whose fragment count does not match its values.
    #[error("query template has {fragments} fragments for {values} values (expected {})", .values + 1)]
    Template { fragments: usize, values: usize },

    /// Any failure reported by Postgres or the driver.
    ///
    /// The underlying cause is logged where it happens and is not carried
    /// past the executor.
    #[error("Database Error")]
    Database,
}
