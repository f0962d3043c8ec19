//! Postgres connection factory.
//!
//! Every statement gets its own connection: [`get_connection`] validates the
//! configuration and returns a [`ConnectionHandle`], and the caller opens and
//! closes it around a single statement. There is no pool.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::ConnectOptions;
use tracing::debug;

use crate::config::{DbConfig, Mode};
use crate::DbError;

/// Query parameter appended to the connection string in production.
pub const REQUIRE_TLS: &str = "sslmode=require";

/// Validated connect options for exactly one session.
///
/// Building a handle performs no I/O.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    options: PgConnectOptions,
}

impl ConnectionHandle {
    /// Open the session.
    pub async fn open(&self) -> Result<PgConnection, sqlx::Error> {
        debug!(
            host = self.options.get_host(),
            port = self.options.get_port(),
            "Opening database connection"
        );
        self.options.connect().await
    }

    pub fn options(&self) -> &PgConnectOptions {
        &self.options
    }
}

/// Build a connection handle from `config`.
///
/// # Errors
/// Returns `DbError::Configuration` when the connection string is absent,
/// is not a `postgres://` URL, or is rejected by the driver.
pub fn get_connection(config: &DbConfig) -> Result<ConnectionHandle, DbError> {
    let url = connection_string(config)?;
    let options = PgConnectOptions::from_str(&url)
        .map_err(|e| DbError::Configuration(format!("invalid connection string: {e}")))?;
    Ok(ConnectionHandle { options })
}

/// The effective connection string for `config`.
///
/// In [`Mode::Production`] the [`REQUIRE_TLS`] parameter is appended; other
/// modes use the string as given.
pub fn connection_string(config: &DbConfig) -> Result<String, DbError> {
    let url = config
        .connection_string
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DbError::Configuration("connection string is not set".into()))?;

    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(DbError::Configuration(
            "connection string must start with postgres:// or postgresql://".into(),
        ));
    }

    match config.mode {
        Mode::Production => {
            let separator = if url.contains('?') { '&' } else { '?' };
            Ok(format!("{url}{separator}{REQUIRE_TLS}"))
        }
        Mode::Development => Ok(url.to_string()),
    }
}
