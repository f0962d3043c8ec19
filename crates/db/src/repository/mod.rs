//! Repository functions, one module per table.
//!
//! Statement builders return a [`SqlQuery`](crate::query::SqlQuery) so the
//! caller decides how and where it runs; read helpers take a
//! [`PgExecutor`](crate::PgExecutor) and return decoded rows.

pub mod schema;
pub mod users;
pub mod customers;
pub mod invoices;
pub mod revenue;
