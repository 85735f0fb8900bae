//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Exchange-rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Exchange-rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Base URL of the primary provider.
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    /// Base URL of the secondary (fallback) provider.
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,
    /// Per-call HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// In-memory rate cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_primary_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

fn default_secondary_url() -> String {
    "https://open.er-api.com/v6/latest".to_string()
}

fn default_http_timeout() -> u64 {
    5
}

fn default_cache_ttl() -> u64 {
    600 // 10 minutes
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            secondary_url: default_secondary_url(),
            http_timeout_secs: default_http_timeout(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("WIREWON").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml_with_defaults() {
        let raw = r#"
            [server]

            [database]
            url = "postgres://localhost/wirewon"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.rates.http_timeout_secs, 5);
        assert_eq!(config.rates.cache_ttl_secs, 600);
        assert!(config.rates.primary_url.contains("exchangerate-api.com"));
        assert!(config.rates.secondary_url.contains("er-api.com"));
    }

    #[test]
    fn test_config_overrides() {
        let raw = r#"
            [server]
            port = 9999

            [database]
            url = "postgres://localhost/test"
            max_connections = 3

            [rates]
            primary_url = "http://127.0.0.1:4000/v4/latest"
            http_timeout_secs = 1
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.rates.primary_url, "http://127.0.0.1:4000/v4/latest");
        assert_eq!(config.rates.http_timeout_secs, 1);
        assert_eq!(config.rates.secondary_url, default_secondary_url());
    }
}
