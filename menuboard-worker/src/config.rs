/// Worker configuration
///
/// | Variable                     | Default | Meaning                              |
/// |------------------------------|---------|--------------------------------------|
/// | `DATABASE_URL`               | -       | Postgres connection string           |
/// | `DATABASE_MAX_CONNECTIONS`   | 10      | Pool size                            |
/// | `WORKER_INTERVAL_SECS`       | 60      | Time between sweep rounds            |
/// | `WAITER_CALL_TTL_MINUTES`    | 30      | Open waiter calls older than this are resolved |
/// | `PENDING_PAYMENT_TTL_HOURS`  | 24      | Pending payments older than this fail |

use chrono::Duration;
use std::env;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub interval: std::time::Duration,
    pub waiter_call_ttl: Duration,
    pub pending_payment_ttl: Duration,
}

impl WorkerConfig {
    /// Loads configuration from the environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &'static str, default: u32| -> Result<u32, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidNumber { key, value }),
            }
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: number("DATABASE_MAX_CONNECTIONS", 10)?,
            interval: std::time::Duration::from_secs(u64::from(number("WORKER_INTERVAL_SECS", 60)?)),
            waiter_call_ttl: Duration::minutes(i64::from(number("WAITER_CALL_TTL_MINUTES", 30)?)),
            pending_payment_ttl: Duration::hours(i64::from(number("PENDING_PAYMENT_TTL_HOURS", 24)?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            WorkerConfig::from_lookup(lookup(&[("DATABASE_URL", "postgresql://localhost/mb")]))
                .unwrap();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.interval, std::time::Duration::from_secs(60));
        assert_eq!(config.waiter_call_ttl, Duration::minutes(30));
        assert_eq!(config.pending_payment_ttl, Duration::hours(24));
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/mb"),
            ("WORKER_INTERVAL_SECS", "15"),
            ("WAITER_CALL_TTL_MINUTES", "10"),
        ]))
        .unwrap();

        assert_eq!(config.interval, std::time::Duration::from_secs(15));
        assert_eq!(config.waiter_call_ttl, Duration::minutes(10));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            WorkerConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let err = WorkerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/mb"),
            ("WORKER_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "WORKER_INTERVAL_SECS", .. }));
    }
}
