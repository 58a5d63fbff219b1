use crate::birth_data::FingerprintScope;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for SkyChart
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkychartConfig {
    /// Completion provider settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Analysis cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Stage parameters of the two-stage pipeline
    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Bearer credential; requests fail fast without it. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Base URL of the OpenAI-compatible API (e.g. "https://api.openai.com/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per completion, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base unit of the retry backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a computed analysis is served from cache
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Entry count above which expired entries are swept on insert
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,

    #[serde(default)]
    pub fingerprint_scope: FingerprintScope,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_threshold: default_sweep_threshold(),
            fingerprint_scope: FingerprintScope::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_chart_temperature")]
    pub chart_temperature: f32,

    #[serde(default = "default_chart_max_tokens")]
    pub chart_max_tokens: usize,

    #[serde(default = "default_narrative_temperature")]
    pub narrative_temperature: f32,

    #[serde(default = "default_narrative_max_tokens")]
    pub narrative_max_tokens: usize,

    /// Serialize concurrent cache misses for the same fingerprint
    #[serde(default = "default_coalesce_in_flight")]
    pub coalesce_in_flight: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chart_temperature: default_chart_temperature(),
            chart_max_tokens: default_chart_max_tokens(),
            narrative_temperature: default_narrative_temperature(),
            narrative_max_tokens: default_narrative_max_tokens(),
            coalesce_in_flight: default_coalesce_in_flight(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_sweep_threshold() -> usize {
    100
}
fn default_chart_temperature() -> f32 {
    0.3
}
fn default_chart_max_tokens() -> usize {
    1000
}
fn default_narrative_temperature() -> f32 {
    0.8
}
fn default_narrative_max_tokens() -> usize {
    3000
}
fn default_coalesce_in_flight() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with smart defaults
pub struct ConfigManager {
    config: SkychartConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.skychart.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading SkyChart configuration...");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config, |key| std::env::var(key).ok());
        Self::validate_config(&config)?;

        Self::log_summary(&config, config_path.as_deref());
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load an explicit config file, still honoring environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        let config = Self::apply_env_overrides(config, |key| std::env::var(key).ok());
        Self::validate_config(&config)?;

        Self::log_summary(&config, Some(path));
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    fn log_summary(config: &SkychartConfig, path: Option<&Path>) {
        match path {
            Some(path) => info!("   Config file: {}", path.display()),
            None => info!("   Config file: NONE (using defaults)"),
        }
        info!("   Provider: {} ({})", config.llm.base_url, config.llm.model);
        info!(
            "   Credential: {}",
            if config.llm.api_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        );
        info!("   Cache TTL: {}s", config.cache.ttl_secs);
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".skychart.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .skychart.env: {}", e);
                } else {
                    info!("Loaded .skychart.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.skychart.toml (current directory)
    /// 2. ~/.skychart/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(SkychartConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".skychart.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".skychart").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((SkychartConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<SkychartConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides read through `lookup`
    pub fn apply_env_overrides<F>(mut config: SkychartConfig, lookup: F) -> SkychartConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SKYCHART_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            if !key.trim().is_empty() {
                config.llm.api_key = Some(SecretString::from(key));
            }
        }
        if let Some(url) = lookup("SKYCHART_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("SKYCHART_MODEL") {
            config.llm.model = model;
        }
        if let Some(timeout) = lookup("SKYCHART_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.llm.timeout_secs = secs;
            }
        }
        if let Some(ttl) = lookup("SKYCHART_CACHE_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                config.cache.ttl_secs = secs;
            }
        }
        if let Some(level) = lookup("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &SkychartConfig) -> Result<(), ConfigError> {
        if config.llm.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }
        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_secs must be positive".to_string(),
            ));
        }
        if config.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_secs must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("chart_temperature", config.pipeline.chart_temperature),
            ("narrative_temperature", config.pipeline.narrative_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "pipeline.{} must be within 0.0..=2.0, got {}",
                    name, value
                )));
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &SkychartConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
