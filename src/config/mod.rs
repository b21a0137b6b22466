// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ProviderConfig, ServerConfig,
    StaticFilesConfig,
};

impl Config {
    /// Load configuration from the default "config.toml" file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Missing files are fine: every key has a default except the provider
    /// API key, which may also come from the `GOOGLE_API_KEY` environment
    /// variable. `PORT` overrides the configured listen port.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("GATEWAY").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("provider.model", "gemini-2.5-flash-preview-05-20")?
            .set_default(
                "provider.api_base",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("provider.timeout", 60)?
            .set_default("static_files.root", "public")?
            .set_default("static_files.entry_document", "index.html")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;

        if cfg.provider.api_key.is_empty() {
            if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
                cfg.provider.api_key = key;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            cfg.server.port = port.parse().map_err(|e| {
                config::ConfigError::Message(format!("Invalid PORT value '{port}': {e}"))
            })?;
        }

        Ok(cfg)
    }

    /// Validate startup requirements
    ///
    /// The process must not bind a listener without a provider credential.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.provider.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "Provider API key is missing. Set provider.api_key in config.toml \
                 or the GOOGLE_API_KEY environment variable."
                    .to_string(),
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
