//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SCHOOLDASH_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SCHOOLDASH_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `SCHOOLDASH_DATABASE__POOL__MAX_CONNECTIONS=20` sets `database.pool.max_connections`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use schooldash::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! database:
//!   url: postgres://localhost:5432/schooldash
//!   pool:
//!     max_connections: 10
//! enable_otel_export: false
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SCHOOLDASH_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; folded into `database.url` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Export traces over OTLP (endpoint configured with the standard `OTEL_EXPORTER_OTLP_*` vars)
    pub enable_otel_export: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    pub pool: PoolSettings,
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/schooldash".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            database: DatabaseConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database.url.trim().is_empty() {
            return Err(Error::Validation {
                message: "Config validation: database.url is empty. Set DATABASE_URL or database.url in the config file."
                    .to_string(),
            });
        }

        let pool = &self.database.pool;
        if pool.max_connections == 0 {
            return Err(Error::Validation {
                message: "Config validation: database.pool.max_connections must be at least 1".to_string(),
            });
        }
        if pool.min_connections > pool.max_connections {
            return Err(Error::Validation {
                message: format!(
                    "Config validation: database.pool.min_connections ({}) cannot be greater than max_connections ({})",
                    pool.min_connections, pool.max_connections
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("SCHOOLDASH_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_yaml_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 127.0.0.1
port: 3000
database:
  pool:
    max_connections: 4
    min_connections: 2
enable_otel_export: true
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.bind_address(), "127.0.0.1:3000");
            assert_eq!(config.database.pool.max_connections, 4);
            assert_eq!(config.database.pool.min_connections, 2);
            // unspecified pool fields keep their defaults
            assert_eq!(config.database.pool.acquire_timeout_secs, 30);
            assert!(config.enable_otel_export);

            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("does-not-exist.yaml"))?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.database.pool, PoolSettings::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 3000\n")?;

            jail.set_env("SCHOOLDASH_HOST", "127.0.0.1");
            jail.set_env("SCHOOLDASH_PORT", "9090");
            jail.set_env("SCHOOLDASH_DATABASE__POOL__MAX_CONNECTIONS", "25");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.database.pool.max_connections, 25);

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_wins() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
database:
  url: postgres://yaml-host/school
  pool:
    max_connections: 3
"#,
            )?;
            jail.set_env("DATABASE_URL", "postgres://env-host/school");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.database.url, "postgres://env-host/school");
            assert!(config.database_url.is_none());
            // pool settings from the file survive the override
            assert_eq!(config.database.pool.max_connections, 3);

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "prot: 8080\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validation_empty_database_url() {
        let mut config = Config::default();
        config.database.url = "   ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn test_validation_pool_bounds() {
        let mut config = Config::default();
        config.database.pool.min_connections = 20;
        config.database.pool.max_connections = 5;
        assert!(config.validate().unwrap_err().to_string().contains("min_connections (20)"));

        config.database.pool.min_connections = 0;
        config.database.pool.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(Config::default().validate().is_ok());
    }
}
