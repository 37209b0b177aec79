use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub analysis: AnalysisConfig,
    /// External prompt classifier, consulted only when rules find no intent
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Empty means patterns are kept in memory only
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Stricter per-client limit for the analyze endpoint
    #[serde(default = "default_analyze_rate_limit")]
    pub analyze_rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Data plan size assumed when the device does not report one (MB)
    #[serde(default = "default_data_plan_mb")]
    pub default_data_plan_mb: f64,

    /// Fixed seed for savings sampling; random when unset
    #[serde(default)]
    pub savings_seed: Option<u64>,

    /// Analyses allowed to run at once before requests are turned away
    #[serde(default = "default_max_concurrent_analyses")]
    pub max_concurrent: usize,

    #[serde(default = "default_analysis_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Service URL (required if enabled)
    #[serde(default)]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,

    /// Rate limit: max requests per minute to the external service
    #[serde(default = "default_classifier_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Number of consecutive failures before the circuit breaker opens
    #[serde(default = "default_circuit_breaker_failures")]
    pub circuit_breaker_failures: u32,

    /// Seconds to keep the circuit breaker open before retry
    #[serde(default = "default_circuit_breaker_reset_secs")]
    pub circuit_breaker_reset_secs: u64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_analyze_rate_limit() -> u32 {
    30
}
fn default_data_plan_mb() -> f64 {
    2000.0
}
fn default_max_concurrent_analyses() -> usize {
    64
}
fn default_analysis_timeout_ms() -> u64 {
    5000
}
fn default_classifier_timeout_ms() -> u64 {
    3000
}
fn default_classifier_rate_limit() -> u32 {
    30
}
fn default_circuit_breaker_failures() -> u32 {
    5
}
fn default_circuit_breaker_reset_secs() -> u64 {
    60
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PG__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PG").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 10
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 120
            analyze_rate_limit_per_minute = 30

            [analysis]
            default_data_plan_mb = 2000.0
            max_concurrent = 64
            timeout_ms = 5000

            [classifier]
            enabled = false
            base_url = ""
            timeout_ms = 3000
            rate_limit_per_minute = 30
            circuit_breaker_failures = 5
            circuit_breaker_reset_secs = 60
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so partial configs can be tested
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.is_configured()
            && self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "logging.format must be json or pretty, got {}",
                self.logging.format
            )));
        }

        if self.security.rate_limit_per_minute == 0
            || self.security.analyze_rate_limit_per_minute == 0
        {
            return Err(ConfigValidationError::InvalidValue(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        if self.analysis.max_concurrent == 0 || self.analysis.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "analysis.max_concurrent and analysis.timeout_ms must be greater than 0"
                    .to_string(),
            ));
        }

        if self.analysis.default_data_plan_mb <= 0.0 {
            return Err(ConfigValidationError::InvalidValue(
                "analysis.default_data_plan_mb must be positive".to_string(),
            ));
        }

        if self.classifier.enabled && self.classifier.base_url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PG__CLASSIFIER__BASE_URL must be set when the classifier is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("server address: {}", e)))
    }
}
