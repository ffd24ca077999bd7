//! Runtime configuration for the kitchen binaries.
//!
//! Values come from command-line flags first, then the environment, then built-in
//! defaults.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;
/// Database used when neither `--database-url` nor `DATABASE_URL` is given.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/kitchen";
/// Environment variable consulted for the database URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Picks the database URL: the explicit flag, else the environment value, else the default.
///
/// Blank values are treated as unset.
pub fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> String {
    explicit
        .filter(|url| !url.trim().is_empty())
        .or_else(|| from_env.filter(|url| !url.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Which document store backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store that starts empty and is lost on exit.
    InMemory,
    /// PostgreSQL at the given URL.
    Postgres {
        /// Connection URL.
        database_url: String,
    },
}

impl StoreConfig {
    /// Resolves the backend from command-line options and `DATABASE_URL`.
    pub fn from_options(database_url: Option<String>, in_memory: bool) -> Self {
        if in_memory {
            return StoreConfig::InMemory;
        }
        StoreConfig::Postgres {
            database_url: resolve_database_url(database_url, env::var(DATABASE_URL_ENV).ok()),
        }
    }

    /// Opens the configured store.
    ///
    /// PostgreSQL connections are made lazily, so this only fails on a malformed URL.
    pub fn open(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match self {
            StoreConfig::InMemory => Ok(Arc::new(InMemoryDocumentStore::new())),
            StoreConfig::Postgres { database_url } => {
                Ok(Arc::new(PostgresDocumentStore::connect_lazy(database_url)?))
            }
        }
    }
}

impl Display for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreConfig::InMemory => f.write_str("in-memory"),
            StoreConfig::Postgres { .. } => f.write_str("postgres"),
        }
    }
}

/// Settings for the `kitchend` HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Backend to serve from.
    pub store: StoreConfig,
    /// Debug-level logging.
    pub verbose: bool,
}

impl ServerConfig {
    /// Fills unset options with defaults.
    pub fn from_options(
        host: Option<String>,
        port: Option<u16>,
        store: StoreConfig,
        verbose: bool,
    ) -> Self {
        Self {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.unwrap_or(DEFAULT_PORT),
            store,
            verbose,
        }
    }

    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
