//! Persistence layer for the dashboard database.
//!
//! Provides the connection factory, the `$n` query builder, a
//! connection-per-statement executor, typed row structs, and repository
//! functions for every table in the dashboard schema. No business logic
//! lives here.

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod models;
pub mod query;
pub mod repository;

pub use config::{DbConfig, Mode};
pub use connection::{get_connection, ConnectionHandle};
pub use error::DbError;
pub use executor::{sql, CommandOutcome, PgExecutor, QueryOutput, SqlExecutor};
pub use query::{SqlQuery, SqlValue};
