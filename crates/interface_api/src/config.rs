//! API configuration

use serde::Deserialize;
use std::time::Duration;

use infra_db::DatabaseConfig;

/// API configuration
///
/// Loaded from `API_*` environment variables, for example `API_PORT=9090`
/// or `API_DATABASE_URL=postgres://...`. Unset keys keep their defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Upper bound on pooled database connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/textile_erp".to_string(),
            log_level: "info".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", defaults.database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("min_connections", i64::from(defaults.min_connections))?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs.to_string())?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings for [`infra_db::create_pool`]
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = ApiConfig {
            port: 9090,
            ..ApiConfig::default()
        };
        assert_eq!(config.server_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_database_config_carries_pool_settings() {
        let config = ApiConfig {
            max_connections: 25,
            min_connections: 5,
            connect_timeout_secs: 3,
            ..ApiConfig::default()
        };
        let db = config.database_config();
        assert_eq!(db.url, "postgres://localhost/textile_erp");
        assert_eq!(db.max_connections, 25);
        assert_eq!(db.min_connections, 5);
        assert_eq!(db.connect_timeout, Duration::from_secs(3));
    }
}
