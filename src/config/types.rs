// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub static_files: StaticFilesConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Generation provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// API key for the generative-language service.
    /// Startup fails when this is empty and `GOOGLE_API_KEY` is unset.
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    /// Base URL of the provider REST API, overridable for testing
    pub api_base: String,
    /// Client-side timeout for a single generation call, in seconds
    pub timeout: u64,
}

/// Static frontend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    /// Directory the frontend assets are served from
    pub root: String,
    /// Document served for any unmatched GET (SPA catch-all)
    pub entry_document: String,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}
