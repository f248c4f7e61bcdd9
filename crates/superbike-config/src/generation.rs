use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

/// Attempt budget used by retrying providers when none is configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Largest generated image accepted from a provider
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 50 << 20;

/// Generation provider and retry configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Name of the provider used when a request does not pick one;
    /// falls back to the first configured provider
    #[serde(default)]
    pub provider: Option<String>,
    /// Attempt budget for providers that retry image-less responses
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Upper bound for a single provider call
    #[serde(default = "default_attempt_timeout", deserialize_with = "deserialize_duration")]
    pub attempt_timeout: Duration,
    /// Upper bound for establishing a provider connection
    #[serde(default = "default_connect_timeout", deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,
    /// Largest generated image accepted from a provider
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, GenerationProviderConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: default_attempt_timeout(),
            connect_timeout: default_connect_timeout(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            providers: IndexMap::new(),
        }
    }
}

/// Configuration for a single generation provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: GenerationProviderType,
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Image model override
    #[serde(default)]
    pub model: Option<String>,
    /// Captioning model override (`openai` only)
    #[serde(default)]
    pub caption_model: Option<String>,
    /// Output size such as `1024x1024` (`openai` only)
    #[serde(default)]
    pub size: Option<String>,
    /// Prompt override
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Supported generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProviderType {
    /// Google Gemini `generateContent` with inline image output, retried
    Gemini,
    /// `OpenAI` captioning followed by a single image edit
    Openai,
}

impl GenerationProviderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Openai => "openai",
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_attempt_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    duration_str::parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid duration '{raw}': {e}")))
}
