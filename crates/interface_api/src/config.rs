//! API configuration

use std::time::Duration;

use domain_loyalty::ServiceConfig;
use infra_db::DatabaseConfig;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Upper bound of the database pool
    pub db_max_connections: u32,
    /// Deadline for the program creation transaction
    pub transaction_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/loyalty".to_string(),
            log_level: "info".to_string(),
            db_max_connections: 10,
            transaction_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    ///
    /// Unset variables keep their default. `DATABASE_URL` is honoured when
    /// `API_DATABASE_URL` is absent.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs.to_string())?
            .set_default("database_url", std::env::var("DATABASE_URL").unwrap_or(defaults.database_url))?
            .set_default("log_level", defaults.log_level)?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("transaction_timeout_secs", defaults.transaction_timeout_secs.to_string())?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone()).max_connections(self.db_max_connections)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            transaction_timeout: Duration::from_secs(self.transaction_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..ApiConfig::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_derived_configs() {
        let config = ApiConfig {
            db_max_connections: 25,
            transaction_timeout_secs: 3,
            ..ApiConfig::default()
        };

        assert_eq!(config.database_config().max_connections, 25);
        assert_eq!(config.service_config().transaction_timeout, Duration::from_secs(3));
    }
}
