// Configuration module entry point
// Loads layered configuration and builds the immutable per-process state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::{AppState, Site};
pub use types::{Config, LogLevel, LoggingConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `config.toml` (if present), the environment,
    /// and the `PORT` variable, in increasing priority
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH, std::env::var("PORT").ok())
    }

    /// Load configuration from specified file path (without extension).
    /// `port_override` wins over every other source for `server.port`.
    pub fn load_from(
        config_path: &str,
        port_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("STATICSRV")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("site.landing_path", "/website/")?
            .set_default("site.index_file", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_override_option("server.port", port_override)?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime would otherwise panic on
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
