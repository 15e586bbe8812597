//! Configuration loading, validation, and management for Relaycord.
//!
//! Loads configuration from `~/.relaycord/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.relaycord/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// User IDs allowed to talk to the bot in direct messages.
    /// Empty = no DMs answered.
    #[serde(default)]
    pub dm_allowlist: Vec<String>,

    /// Discord bot settings
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Completion provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Attachment and context size limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Typing indicator settings
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Message and attachment cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Override for the bot's own user ID (otherwise looked up at startup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("user_id", &self.user_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|s| s.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest non-image attachment (bytes) turned into text
    #[serde(default = "default_max_attachment_size")]
    pub max_attachment_size: u64,

    /// Largest image attachment (bytes) forwarded to the model
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,

    /// Context weight budget for the reply-chain history
    #[serde(default = "default_max_context_size")]
    pub max_context_size: usize,

    /// Maximum reply-chain hops walked per request
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    /// Longest side, in pixels, of re-encoded images
    #[serde(default = "default_image_max_dimension")]
    pub image_max_dimension: u32,
}

fn default_max_attachment_size() -> u64 {
    512 * 1024
}
fn default_max_image_size() -> u64 {
    10 * 1024 * 1024
}
fn default_max_context_size() -> usize {
    200_000
}
fn default_max_chain_depth() -> usize {
    100
}
fn default_image_max_dimension() -> u32 {
    1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_attachment_size: default_max_attachment_size(),
            max_image_size: default_max_image_size(),
            max_context_size: default_max_context_size(),
            max_chain_depth: default_max_chain_depth(),
            image_max_dimension: default_image_max_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_presence_interval")]
    pub interval_secs: u64,
}

fn default_presence_interval() -> u64 {
    10
}

impl PresenceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_presence_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory", "file" or "none"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Directory for the file backend (default: ~/.relaycord/cache)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_cache_backend() -> String {
    "memory".into()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for Discord REST calls and attachment downloads
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for a whole streamed completion
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_completion_timeout() -> u64 {
    300
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            completion_timeout_secs: default_completion_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.relaycord/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides:
    /// - `RELAYCORD_DISCORD_TOKEN`, then `DISCORD_TOKEN`
    /// - `RELAYCORD_ANTHROPIC_KEY`, then `ANTHROPIC_API_KEY`
    /// - `RELAYCORD_MODEL`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.discord.bot_token.is_none() {
            config.discord.bot_token = std::env::var("RELAYCORD_DISCORD_TOKEN")
                .ok()
                .or_else(|| std::env::var("DISCORD_TOKEN").ok());
        }

        if config.anthropic.api_key.is_none() {
            config.anthropic.api_key = std::env::var("RELAYCORD_ANTHROPIC_KEY")
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("RELAYCORD_MODEL") {
            config.anthropic.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".relaycord")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Directory used by the file cache backend.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("cache"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_context_size == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_context_size must be > 0".into(),
            ));
        }

        if self.limits.image_max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.image_max_dimension must be > 0".into(),
            ));
        }

        if self.presence.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "presence.interval_secs must be > 0".into(),
            ));
        }

        if !matches!(self.cache.backend.as_str(), "memory" | "file" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "cache.backend must be one of memory, file, none (got '{}')",
                self.cache.backend
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
