//! Server configuration for `PassOP`.
//!
//! Loads configuration from environment variables. The database connection
//! string is required; everything else has a default and can be overridden
//! via `PASSOP_*` variables.

use std::net::SocketAddr;

/// Default port, used when neither `PORT` nor `PASSOP_BIND_ADDR` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend, derived from the connection string.
    pub storage_backend: StorageBackendType,
    /// Name of the collection holding password records.
    pub collection: String,
    /// Honour the `X-User-Id` header to scope reads and writes to one owner.
    pub scope_to_owner: bool,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

/// Supported storage backend types.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// `RocksDB` persistent storage at a filesystem path.
    RocksDb { path: String },
    /// PostgreSQL `JSONB` document storage.
    Postgres { url: String },
}

impl std::fmt::Debug for StorageBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::RocksDb { path } => f.debug_struct("RocksDb").field("path", path).finish(),
            // Connection strings carry credentials.
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("url", &"[redacted]")
                .finish(),
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable was not set.
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    /// A variable was set to an unusable value.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl StorageBackendType {
    /// Derive the backend from a connection string.
    ///
    /// Accepted forms: `memory://`, `rocksdb://<path>`, and
    /// `postgres://...` / `postgresql://...`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown schemes or an empty
    /// `RocksDB` path.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            name: "DATABASE_URL",
            reason,
        };

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(invalid("expected a URL of the form <scheme>://...".to_owned()));
        };

        match scheme.to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "rocksdb" => {
                if rest.is_empty() {
                    Err(invalid("rocksdb:// requires a path".to_owned()))
                } else {
                    Ok(Self::RocksDb {
                        path: rest.to_owned(),
                    })
                }
            }
            "postgres" | "postgresql" => Ok(Self::Postgres {
                url: url.to_owned(),
            }),
            other => Err(invalid(format!("unsupported database scheme '{other}'"))),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` / `PASSOP_DATABASE_URL`: connection string (required)
    /// - `PORT`: port to bind on `0.0.0.0` (default: `3000`)
    /// - `PASSOP_BIND_ADDR`: full bind address (overrides `PORT`)
    /// - `PASSOP_COLLECTION`: record collection name (default: `passwords`)
    /// - `PASSOP_SCOPE_TO_OWNER`: honour `X-User-Id` (default: `true`)
    /// - `PASSOP_LOG_LEVEL`: log filter (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the connection string is missing or any
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Priority: PASSOP_BIND_ADDR > PORT > default 0.0.0.0:3000
        let bind_addr = if let Some(addr) = lookup("PASSOP_BIND_ADDR") {
            addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                name: "PASSOP_BIND_ADDR",
                reason: format!("{e}"),
            })?
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
        };

        let database_url = lookup("PASSOP_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing {
                name: "DATABASE_URL",
            })?;
        let storage_backend = StorageBackendType::from_url(&database_url)?;

        let collection = lookup("PASSOP_COLLECTION").unwrap_or_else(|| "passwords".to_owned());
        if collection.is_empty()
            || !collection
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(ConfigError::Invalid {
                name: "PASSOP_COLLECTION",
                reason: "may only contain alphanumeric characters, '_' and '-'".to_owned(),
            });
        }

        let scope_to_owner = lookup("PASSOP_SCOPE_TO_OWNER")
            .map_or(true, |v| v != "false" && v != "0");

        let log_level = lookup("PASSOP_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        Ok(Self {
            bind_addr,
            storage_backend,
            collection,
            scope_to_owner,
            log_level,
        })
    }
}
