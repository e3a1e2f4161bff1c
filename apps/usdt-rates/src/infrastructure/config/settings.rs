//! Service Configuration Settings
//!
//! Configuration types for the rate service, loaded from environment
//! variables and optionally overridden by command-line flags.

use std::time::Duration;

use super::cli::CliArgs;
use crate::infrastructure::garantex::{DEFAULT_BASE_URL, GarantexConfig};

/// Default application name.
pub const DEFAULT_APP_NAME: &str = "usdt-rates";

/// Database connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Host name.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 5432,
            database: "usdt".to_string(),
            max_connections: 5,
        }
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Server port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health/metrics HTTP port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_port: 50051,
            metrics_port: 9090,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Application name used in logs and traces.
    pub app_name: String,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Server port settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Quote source settings.
    pub garantex: GarantexConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            garantex: GarantexConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let server = ServerSettings {
            grpc_port: parse_or(&get, "PORT", defaults.server.grpc_port)?,
            metrics_port: parse_or(&get, "METRICS_PORT", defaults.server.metrics_port)?,
        };

        let database = DatabaseSettings {
            user: get("DB_USER").unwrap_or(defaults.database.user),
            password: get("DB_PASSWORD").unwrap_or(defaults.database.password),
            host: get("DB_HOST").unwrap_or(defaults.database.host),
            port: parse_or(&get, "DB_PORT", defaults.database.port)?,
            database: get("DB_DATABASE").unwrap_or(defaults.database.database),
            max_connections: parse_positive_or(
                &get,
                "DB_MAX_CONNECTIONS",
                defaults.database.max_connections,
            )?,
        };

        let garantex = GarantexConfig {
            base_url: get("GARANTEX_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_positive_or(
                &get,
                "GARANTEX_TIMEOUT_SECS",
                defaults.garantex.timeout.as_secs(),
            )?),
        };

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            server,
            database,
            garantex,
        })
    }

    /// Apply command-line flags on top of the loaded values.
    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.grpc_port = port;
        }
        if let Some(port) = args.metrics_port {
            self.server.metrics_port = port;
        }
        if let Some(level) = &args.log_level {
            self.log_level.clone_from(level);
        }
        if let Some(name) = &args.app_name {
            self.app_name.clone_from(name);
        }
        if let Some(user) = &args.db_user {
            self.database.user.clone_from(user);
        }
        if let Some(password) = &args.db_password {
            self.database.password.clone_from(password);
        }
        if let Some(host) = &args.db_host {
            self.database.host.clone_from(host);
        }
        if let Some(port) = args.db_port {
            self.database.port = port;
        }
        if let Some(database) = &args.db_database {
            self.database.database.clone_from(database);
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Like [`parse_or`], but zero is rejected.
fn parse_positive_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: get(key).unwrap_or_default(),
        });
    }
    Ok(value)
}

// =============================================================================
// Tests
// =============================================================================
