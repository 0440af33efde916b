//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bracket_engine::bracket::SeedingStrategy;
use bracket_engine::db::{DatabaseConfig, DatabaseConfigError};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Where tournaments are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                var: "STORAGE".to_string(),
                reason: format!("expected 'postgres' or 'memory', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape endpoint, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    pub storage: StorageBackend,
    /// Database configuration, present for `StorageBackend::Postgres`
    pub database: Option<DatabaseConfig>,
    /// Seeding used when a create request does not name one
    pub default_seeding: SeedingStrategy,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `storage_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        storage_override: Option<StorageBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                parse_addr("SERVER_BIND", &raw)?
            }
        };

        let metrics_bind = std::env::var("METRICS_BIND")
            .ok()
            .map(|raw| parse_addr("METRICS_BIND", &raw))
            .transpose()?;

        let storage = match storage_override {
            Some(storage) => storage,
            None => std::env::var("STORAGE")
                .ok()
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(StorageBackend::Postgres),
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => {
                let database_url = database_url_override
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Set a PostgreSQL URL or run with STORAGE=memory".to_string(),
                    })?;
                Some(DatabaseConfig::from_env_with_url(database_url)?)
            }
        };

        let default_seeding = std::env::var("DEFAULT_SEEDING")
            .ok()
            .map(|s| {
                s.parse().map_err(|_| ConfigError::Invalid {
                    var: "DEFAULT_SEEDING".to_string(),
                    reason: format!("expected 'random', 'random:<seed>' or 'preserve_order', got '{s}'"),
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(ServerConfig {
            bind,
            metrics_bind,
            storage,
            database,
            default_seeding,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        match (&self.storage, &self.database) {
            (StorageBackend::Postgres, None) => {
                return Err(ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Required when STORAGE=postgres".to_string(),
                });
            }
            (StorageBackend::Postgres, Some(database)) => {
                if database.max_connections == 0 {
                    return Err(ConfigError::Invalid {
                        var: "DB_MAX_CONNECTIONS".to_string(),
                        reason: "Must be greater than 0".to_string(),
                    });
                }

                if database.min_connections > database.max_connections {
                    return Err(ConfigError::Invalid {
                        var: "DB_MIN_CONNECTIONS".to_string(),
                        reason: format!(
                            "Cannot exceed max connections ({})",
                            database.max_connections
                        ),
                    });
                }
            }
            (StorageBackend::Memory, _) => {}
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

impl From<DatabaseConfigError> for ConfigError {
    fn from(err: DatabaseConfigError) -> Self {
        match err {
            DatabaseConfigError::MissingUrl => ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Set a PostgreSQL URL or run with STORAGE=memory".to_string(),
            },
            DatabaseConfigError::InvalidNumber { name, value } => ConfigError::Invalid {
                var: name.to_string(),
                reason: format!("'{value}' is not a valid number"),
            },
        }
    }
}

/// Helper to parse a socket address variable
fn parse_addr(var: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("'{value}' is not an IP:PORT address"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn memory_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            metrics_bind: None,
            storage: StorageBackend::Memory,
            database: None,
            default_seeding: SeedingStrategy::default(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Use STORAGE=memory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("STORAGE=memory"));
    }

    #[test]
    fn test_storage_parse() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_validation_metrics_bind_collision() {
        let mut config = memory_config();
        config.metrics_bind = Some(config.bind);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validation_pool_sizes() {
        let mut config = memory_config();
        config.storage = StorageBackend::Postgres;
        config.database = Some(DatabaseConfig {
            database_url: "test".to_string(),
            max_connections: 2,
            min_connections: 5, // Invalid: more than max
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DB_MIN_CONNECTIONS"));
    }

    #[test]
    #[serial]
    fn test_from_env_memory_needs_no_database() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::set_var("DEFAULT_SEEDING", "preserve_order");
        }

        let config = ServerConfig::from_env(None, None, Some(StorageBackend::Memory)).unwrap();
        unsafe { std::env::remove_var("DEFAULT_SEEDING") };

        assert!(config.database.is_none());
        assert_eq!(
            config.default_seeding,
            "preserve_order".parse::<SeedingStrategy>().unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_postgres_requires_url() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe { std::env::remove_var("DATABASE_URL") };

        let err = ServerConfig::from_env(None, None, Some(StorageBackend::Postgres)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));

        let config = ServerConfig::from_env(
            None,
            Some("postgres://localhost/brackets".to_string()),
            Some(StorageBackend::Postgres),
        )
        .unwrap();
        assert_eq!(
            config.database.unwrap().database_url,
            "postgres://localhost/brackets"
        );
    }
}
