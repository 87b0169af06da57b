// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::{
    AppConfig, Config, CorsConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StoreBackend, StoreConfig, DEFAULT_ALLOW_HEADERS, DEFAULT_ALLOW_METHODS,
};

/// Prefix for environment overrides, e.g. `ITEMS_SERVER__PORT=9000`
const ENV_PREFIX: &str = "ITEMS";

impl Config {
    /// Load configuration from the file named by `ITEMS_CONFIG`
    /// Default config file is "config.toml" when the variable is unset
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("ITEMS_CONFIG").unwrap_or_else(|_| "config".to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, std::env::vars().collect())
    }

    /// Load configuration against an explicit environment map.
    ///
    /// The Lambda-style variables (`TABLE_NAME`, `ENVIRONMENT`/`STAGE`,
    /// `LOG_LEVEL`, `DYNAMODB_ENDPOINT`) only provide defaults; the config
    /// file and `ITEMS_*` variables win over them.
    pub fn load_with_env(
        config_path: &str,
        env: HashMap<String, String>,
    ) -> Result<Self, config::ConfigError> {
        let table_name = env.get("TABLE_NAME").filter(|t| !t.is_empty()).cloned();
        let environment = env
            .get("ENVIRONMENT")
            .or_else(|| env.get("STAGE"))
            .cloned()
            .unwrap_or_else(|| "development".to_string());
        let log_level = env
            .get("LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| "info".to_string());
        let backend = if table_name.is_some() { "dynamo" } else { "memory" };

        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("app.environment", environment)?
            .set_default("store.backend", backend)?
            .set_default("store.timeout_ms", 5000)?
            .set_default("logging.level", log_level)?
            .set_default("logging.format", "text")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("http.cors.allow_origin", "*")?
            .set_default("http.cors.allow_headers", DEFAULT_ALLOW_HEADERS)?
            .set_default("http.cors.allow_methods", DEFAULT_ALLOW_METHODS)?;

        if let Some(table) = table_name {
            builder = builder.set_default("store.table_name", table)?;
        }
        if let Some(endpoint) = env.get("DYNAMODB_ENDPOINT") {
            builder = builder.set_default("store.endpoint_url", endpoint.clone())?;
        }

        let settings = builder
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env)),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Deadline applied to each store call
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    /// Whether connections are kept open between requests
    pub const fn keep_alive_enabled(&self) -> bool {
        self.performance.keep_alive_timeout > 0
    }

    /// Per-connection deadline covering both read and write
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(std::cmp::max(
            self.performance.read_timeout,
            self.performance.write_timeout,
        ))
    }
}
