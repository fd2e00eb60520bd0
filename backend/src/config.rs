//! Runtime configuration, read from `SHIPDOCS_*` environment variables.
//!
//! Every setting has a default, so an empty environment gives a working local
//! server on `127.0.0.1:8080` backed by `shipdocs.sqlite`.

use crate::error::{Error, Result};
use crate::services::identifiers::generator::{ScopeMode, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
use crate::store::FieldStorage;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_HOST: &str = "SHIPDOCS_HOST";
pub const ENV_PORT: &str = "SHIPDOCS_PORT";
pub const ENV_DB_PATH: &str = "SHIPDOCS_DB_PATH";
pub const ENV_SCOPE_MODE: &str = "SHIPDOCS_SCOPE_MODE";
pub const ENV_FIELD_STORAGE: &str = "SHIPDOCS_FIELD_STORAGE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "SHIPDOCS_BUSY_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SHIPDOCS_REQUEST_TIMEOUT_MS";
pub const ENV_MAX_ATTEMPTS: &str = "SHIPDOCS_MAX_ATTEMPTS";
pub const ENV_RETRY_BACKOFF_MS: &str = "SHIPDOCS_RETRY_BACKOFF_MS";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub scope_mode: ScopeMode,
    /// Representation used when writing new schemas.
    pub field_storage: FieldStorage,
    /// How long SQLite waits on a locked database before reporting busy.
    pub busy_timeout: Duration,
    pub request_timeout: Duration,
    /// Attempts per identifier request when the store is unavailable.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: PathBuf::from("shipdocs.sqlite"),
            scope_mode: ScopeMode::default(),
            field_storage: FieldStorage::default(),
            busy_timeout: Duration::from_millis(5_000),
            request_timeout: Duration::from_millis(10_000),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_BACKOFF,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, ENV_PORT)? {
            config.port = port;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(mode) = lookup(ENV_SCOPE_MODE) {
            config.scope_mode = mode.parse()?;
        }
        if let Some(storage) = lookup(ENV_FIELD_STORAGE) {
            config.field_storage = storage.parse()?;
        }
        if let Some(ms) = parse(&lookup, ENV_BUSY_TIMEOUT_MS)? {
            config.busy_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse::<u32, _>(&lookup, ENV_MAX_ATTEMPTS)? {
            if attempts == 0 {
                return Err(Error::InvalidInput(format!("{ENV_MAX_ATTEMPTS} must be at least 1")));
            }
            config.max_attempts = attempts;
        }
        if let Some(ms) = parse(&lookup, ENV_RETRY_BACKOFF_MS)? {
            config.retry_backoff = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::InvalidInput(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.scope_mode, ScopeMode::Global);
        assert_eq!(config.field_storage, FieldStorage::Structured);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            (ENV_PORT, "9090"),
            (ENV_DB_PATH, "/tmp/docs.sqlite"),
            (ENV_SCOPE_MODE, "per_customer"),
            (ENV_FIELD_STORAGE, "text"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
            (ENV_MAX_ATTEMPTS, "2"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.db_path, PathBuf::from("/tmp/docs.sqlite"));
        assert_eq!(config.scope_mode, ScopeMode::PerCustomer);
        assert_eq!(config.field_storage, FieldStorage::Text);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[(ENV_PORT, "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_SCOPE_MODE, "tenant")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_FIELD_STORAGE, "xml")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_MAX_ATTEMPTS, "0")])).is_err());
    }
}
