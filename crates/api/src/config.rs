//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use ims_infra::DbSettings;
use ims_observability::{LogConfig, LogFormat};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),

    #[error("invalid {var}='{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which adapters back the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process-local stores and cache (dev/test).
    InMemory,
    /// Postgres for rows, Redis for the validation cache.
    Persistent { db: DbSettings, redis_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or("BIND_ADDR", &lookup, DEFAULT_BIND_ADDR.parse().ok())?;

        let persistent: bool = parse_or("USE_PERSISTENT_STORES", &lookup, Some(false))?;
        let storage = if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;

            let mut db = DbSettings::new(url);
            db.max_connections =
                parse_or("DATABASE_MAX_CONNECTIONS", &lookup, Some(db.max_connections))?;
            let timeout_secs: u64 = parse_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                &lookup,
                Some(db.acquire_timeout.as_secs()),
            )?;
            db.acquire_timeout = Duration::from_secs(timeout_secs);

            StorageConfig::Persistent {
                db,
                redis_url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            }
        } else {
            StorageConfig::InMemory
        };

        let format: LogFormat = parse_or("LOG_FORMAT", &lookup, Some(LogFormat::Json))?;

        Ok(Self {
            bind_addr,
            storage,
            log: LogConfig {
                format,
                ..LogConfig::default()
            },
        })
    }

    /// In-memory storage on an ephemeral local port; used by tests.
    pub fn in_memory() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            storage: StorageConfig::InMemory,
            log: LogConfig::default(),
        }
    }
}

fn parse_or<T, F>(var: &'static str, lookup: &F, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => default.ok_or(ConfigError::Missing(var)),
    }
}
