//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use secrecy::SecretString;
use superbike_config::{
    BrandingConfig, Config, GenerationConfig, GenerationProviderConfig, GenerationProviderType, HealthConfig,
    ServerConfig,
};

/// Logo written once per test binary and shared by every server
fn logo_path() -> PathBuf {
    static LOGO: OnceLock<tempfile::TempDir> = OnceLock::new();

    let dir = LOGO.get_or_init(|| {
        let dir = tempfile::tempdir().expect("create logo dir");
        std::fs::write(dir.path().join("logo.png"), super::png(40, 20, [0, 0, 255])).expect("write logo");
        dir
    });

    dir.path().join("logo.png")
}

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    ///
    /// Banner text is drawn with the built-in font so output does not depend
    /// on installed system fonts.
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                generation: GenerationConfig::default(),
                branding: BrandingConfig {
                    logo_path: Some(logo_path()),
                    fonts: Vec::new(),
                    ..BrandingConfig::default()
                },
                telemetry: None,
            },
        }
    }

    fn with_provider(mut self, name: &str, provider_type: GenerationProviderType, base_url: &str) -> Self {
        self.config.generation.providers.insert(
            name.to_owned(),
            GenerationProviderConfig {
                provider_type,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                model: None,
                caption_model: None,
                size: None,
                prompt: None,
            },
        );
        self
    }

    /// Add a Gemini provider pointed at a mock backend
    pub fn with_gemini_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, GenerationProviderType::Gemini, base_url)
    }

    /// Add an OpenAI provider pointed at a mock backend
    pub fn with_openai_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, GenerationProviderType::Openai, base_url)
    }

    /// Pick the provider used when a request names none
    pub fn with_default_provider(mut self, name: &str) -> Self {
        self.config.generation.provider = Some(name.to_owned());
        self
    }

    /// Set the attempt budget for retrying providers
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.generation.max_attempts = max_attempts;
        self
    }

    /// Set the per-call provider timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation.attempt_timeout = timeout;
        self
    }

    /// Cap the size of downloaded generated images
    pub fn with_max_image_bytes(mut self, bytes: usize) -> Self {
        self.config.generation.max_image_bytes = bytes;
        self
    }

    /// Set the download file name
    pub fn with_download_filename(mut self, name: &str) -> Self {
        self.config.branding.download_filename = name.to_owned();
        self
    }

    /// Set the upload body limit
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.config.server.body_limit_bytes = bytes;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
