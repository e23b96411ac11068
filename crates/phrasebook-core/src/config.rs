//! Service configuration
//!
//! Configuration is plain serde data with defaults for every field. Hosts
//! load it from a file (or start from `Default`) and then overlay the
//! process environment with [`ServiceConfig::apply_env`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default minimum word length in code points
pub const DEFAULT_MIN_WORD_LENGTH: usize = 1;

/// Default maximum word length in code points
pub const DEFAULT_MAX_WORD_LENGTH: usize = 30;

/// Default model used for example generation
pub const DEFAULT_MODEL_ID: &str = "amazon.nova-lite-v1:0";

/// Default token budget for a single reply
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 1000;

/// Default Telegram Bot API base URL
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Top-level configuration for a [`crate::WordService`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Word length bounds
    pub limits: WordLimits,

    /// Model provider settings
    pub model: ModelConfig,

    /// Operational notification settings
    pub notifications: NotificationConfig,
}

/// Inclusive word length bounds, counted in Unicode code points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordLimits {
    pub min_length: usize,
    pub max_length: usize,
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider region, used to derive the default endpoint
    pub region: Option<String>,

    /// Model identifier
    pub model_id: String,

    /// Endpoint override (for VPC endpoints and tests)
    pub endpoint: Option<String>,

    /// Bearer token for the provider API
    pub api_key: Option<String>,

    /// Token budget sent with every request
    pub max_new_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Telegram notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

impl WordLimits {
    /// Create bounds, rejecting `min == 0` and `min > max`
    pub fn new(min_length: usize, max_length: usize) -> Result<Self> {
        let limits = Self { min_length, max_length };
        limits.validate()?;
        Ok(limits)
    }

    /// Check that the bounds are usable
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(Error::configuration("minimum word length must be at least 1"));
        }
        if self.min_length > self.max_length {
            return Err(Error::configuration(format!(
                "minimum word length {} exceeds maximum {}",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

impl Default for WordLimits {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_WORD_LENGTH,
            max_length: DEFAULT_MAX_WORD_LENGTH,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            region: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint: None,
            api_key: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            timeout_secs: 30,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Overlay values from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("AWS_REGION") {
            self.model.region = Some(region);
        }
        if let Some(model_id) = non_empty("PHRASEBOOK_MODEL_ID") {
            self.model.model_id = model_id;
        }
        if let Some(endpoint) = non_empty("PHRASEBOOK_MODEL_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Some(api_key) = non_empty("AWS_BEARER_TOKEN_BEDROCK") {
            self.model.api_key = Some(api_key);
        }
        if let Some(min) = non_empty("PHRASEBOOK_MIN_WORD_LENGTH") {
            self.limits.min_length = parse_length("PHRASEBOOK_MIN_WORD_LENGTH", &min)?;
        }
        if let Some(max) = non_empty("PHRASEBOOK_MAX_WORD_LENGTH") {
            self.limits.max_length = parse_length("PHRASEBOOK_MAX_WORD_LENGTH", &max)?;
        }
        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.notifications.bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
            self.notifications.chat_id = Some(chat_id);
        }

        self.limits.validate()
    }
}

fn parse_length(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|e| Error::Configuration {
        message: format!("{} must be a non-negative integer, got {:?}", key, value),
        source: Some(anyhow::anyhow!(e)),
    })
}
