// ⚙️ Configuration - TOML file + EXPENSE_* environment overrides
//
// Connection parameters are never embedded as literals: the database layer
// receives a DatabaseConfig at construction.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "expense-manager.toml";

/// Environment variable that points at an alternative config file
pub const CONFIG_PATH_ENV: &str = "EXPENSE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

// ============================================================================
// DATABASE
// ============================================================================

/// Database connection options: `{host, user, password, database}`
///
/// The store is SQLite, so `database` is the path of the database file and
/// `host` must name the local machine. `password` is redacted in Debug output.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: Secret<String>,

    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

fn default_password() -> Secret<String> {
    Secret::new(String::new())
}

fn default_database() -> String {
    "expense_manager.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: default_host(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
        }
    }
}

impl DatabaseConfig {
    /// Config pointing at a specific database file on the local host
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        DatabaseConfig {
            database: path.as_ref().to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    pub fn is_local_host(&self) -> bool {
        matches!(self.host.as_str(), "" | "localhost" | "127.0.0.1" | "::1")
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.database)
    }

    /// Human-readable target for logs and errors (never includes the password)
    pub fn target(&self) -> String {
        format!("{}@{}/{}", self.user, self.host, self.database)
    }
}

// ============================================================================
// SERVER
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_server_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// APP
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from `$EXPENSE_CONFIG` (or `expense-manager.toml`) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load_from(&path)
    }

    /// Load from a specific TOML file; a missing file leaves the defaults in place.
    /// `EXPENSE_DATABASE__HOST` style variables override the file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("EXPENSE_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load_from(Path::new("missing.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.database.host, "localhost");
            assert_eq!(config.database.user, "root");
            assert_eq!(config.database.database, "expense_manager.db");
            assert!(config.database.password.expose_secret().is_empty());
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "expense-manager.toml",
                r#"
                log_level = "debug"

                [database]
                host = "localhost"
                user = "ledger"
                password = "hunter2"
                database = "/tmp/expenses.db"

                [server]
                port = 8080
                "#,
            )?;
            jail.set_env("EXPENSE_DATABASE__DATABASE", "/var/lib/expenses.db");

            let config = AppConfig::load_from(Path::new("expense-manager.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.database.user, "ledger");
            assert_eq!(config.database.password.expose_secret(), "hunter2");
            assert_eq!(config.database.database, "/var/lib/expenses.db");
            assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
            assert_eq!(config.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let config = DatabaseConfig {
            password: Secret::new("root-password".to_string()),
            ..Default::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("root-password"));
        assert!(debug_output.contains("REDACTED"));
        assert!(!config.target().contains("root-password"));
    }

    #[test]
    fn test_local_host_detection() {
        let mut config = DatabaseConfig::for_path("expenses.db");
        assert!(config.is_local_host());

        config.host = "db.example.com".to_string();
        assert!(!config.is_local_host());
    }
}
