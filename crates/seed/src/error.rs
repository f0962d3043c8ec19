//! Seeding error types.

use thiserror::Error;

/// One record that could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Natural key of the record (`id`, or `month` for revenue).
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Errors produced by the seeding pipeline.
///
/// Every variant names the table whose seeding was aborted, except
/// [`SeedError::Data`] which fails before any table is touched.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Creating the table (or its extension) failed.
    #[error("error seeding {table}: schema setup failed: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: db::DbError,
    },

    /// One or more record inserts failed; all of them are listed.
    #[error("error seeding {table}: {} of {attempted} record(s) failed: {}", .failures.len(), join(.failures))]
    Records {
        table: &'static str,
        attempted: usize,
        failures: Vec<RecordFailure>,
    },

    /// The seed document could not be parsed.
    #[error("invalid seed data: {0}")]
    Data(#[from] serde_json::Error),
}

impl SeedError {
    /// The table whose seeding failed, if any.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Self::Schema { table, .. } | Self::Records { table, .. } => Some(*table),
            Self::Data(_) => None,
        }
    }
}

/// Errors from password hashing or verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is not a valid PHC string")]
    InvalidHashFormat,
}

fn join(failures: &[RecordFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
