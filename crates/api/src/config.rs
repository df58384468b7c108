//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use textileops_infra::DbConfig;
use textileops_inventory::NegativeStockPolicy;
use textileops_observability::LogFormat;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://textileops.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DbConfig,
    pub bind_addr: SocketAddr,
    pub negative_stock_policy: NegativeStockPolicy,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads `DATABASE_URL`, `BIND_ADDR`, `NEGATIVE_STOCK_POLICY`,
    /// `DB_MAX_CONNECTIONS` and `LOG_FORMAT`; unset variables take defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// In-memory database, ephemeral port, default policy.
    pub fn for_tests() -> Self {
        Self {
            database: DbConfig::in_memory(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            negative_stock_policy: NegativeStockPolicy::default(),
            log_format: LogFormat::Pretty,
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let mut database = DbConfig::new(url);

        if let Some(raw) = lookup("DB_MAX_CONNECTIONS") {
            database.max_connections = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::invalid("DB_MAX_CONNECTIONS", "expected a positive integer"))?;
        }

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let negative_stock_policy = match lookup("NEGATIVE_STOCK_POLICY") {
            Some(raw) => raw
                .parse::<NegativeStockPolicy>()
                .map_err(|e| ConfigError::invalid("NEGATIVE_STOCK_POLICY", e.to_string()))?,
            None => NegativeStockPolicy::default(),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database,
            bind_addr,
            negative_stock_policy,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.negative_stock_policy, NegativeStockPolicy::Allow);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn reject_policy_and_pool_size_are_read() {
        let cfg = config(&[
            ("NEGATIVE_STOCK_POLICY", "Reject"),
            ("DB_MAX_CONNECTIONS", "8"),
            ("DATABASE_URL", "sqlite::memory:"),
        ])
        .unwrap();
        assert_eq!(cfg.negative_stock_policy, NegativeStockPolicy::Reject);
        assert_eq!(cfg.database.max_connections, 8);
        assert!(cfg.database.is_in_memory());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("DB_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(err.to_string().starts_with("DB_MAX_CONNECTIONS"));

        let err = config(&[("NEGATIVE_STOCK_POLICY", "clamp")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "NEGATIVE_STOCK_POLICY", .. }));

        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
