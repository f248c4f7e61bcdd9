use std::sync::Arc;

use secrecy::SecretString;
use superbike_config::{Config, GenerationProviderConfig, GenerationProviderType};

use crate::{
    error::{ImageGenError, Result},
    orchestrator::{AttemptObserver, run_attempts},
    provider::{GenerationClient, gemini::GeminiClient, http_client::http_client, openai::OpenAiClient},
    types::{GenerationOutcome, GenerationRequest, SourceImage},
};

/// Result of one generation run
#[derive(Debug)]
pub struct Generation {
    /// Name of the provider that handled the request
    pub provider: String,
    pub outcome: GenerationOutcome,
}

/// Configured providers, selectable by name
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn GenerationClient>>,
    default_provider: Option<String>,
}

impl ProviderRegistry {
    /// Registry over already-built clients
    ///
    /// Without a `default_provider` the first client handles requests that
    /// do not name one.
    pub fn from_clients(providers: Vec<Arc<dyn GenerationClient>>, default_provider: Option<String>) -> Self {
        Self {
            providers,
            default_provider,
        }
    }

    /// Provider names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    /// Look up a provider by name, or the default one
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn GenerationClient>> {
        let wanted = name.or(self.default_provider.as_deref());

        let provider = match wanted {
            Some(wanted) => self
                .providers
                .iter()
                .find(|p| p.name() == wanted)
                .ok_or_else(|| ImageGenError::ProviderNotFound(wanted.to_string()))?,
            None => self.providers.first().ok_or_else(|| {
                ImageGenError::ProviderNotFound("No generation providers configured".to_string())
            })?,
        };

        Ok(Arc::clone(provider))
    }

    /// Produce a generated image for `source`
    ///
    /// Runs the provider's describe step once, then attempts generation under
    /// the provider's retry policy.
    pub async fn generate(
        &self,
        provider: Option<&str>,
        source: SourceImage,
        observer: &mut dyn AttemptObserver,
    ) -> Result<Generation> {
        let client = self.resolve(provider)?;

        let caption = client.describe(&source).await?;

        let request = GenerationRequest {
            source,
            prompt: client.prompt().to_string(),
            caption,
        };

        let outcome = run_attempts(client.as_ref(), &request, client.retry_policy(), observer).await?;

        Ok(Generation {
            provider: client.name().to_string(),
            outcome,
        })
    }
}

/// Builds the provider registry from configuration
pub struct ProviderRegistryBuilder<'a> {
    config: &'a Config,
}

impl<'a> ProviderRegistryBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<ProviderRegistry> {
        let generation = &self.config.generation;
        let client = http_client(generation.attempt_timeout, generation.connect_timeout)?;

        let mut providers: Vec<Arc<dyn GenerationClient>> = Vec::new();

        for (name, provider_config) in &generation.providers {
            tracing::debug!("Initializing generation provider: {name}");

            let api_key = resolve_api_key(name, provider_config)?;
            let base_url = provider_config.base_url.as_ref().map(ToString::to_string);

            let provider: Arc<dyn GenerationClient> = match provider_config.provider_type {
                GenerationProviderType::Gemini => Arc::new(
                    GeminiClient::new(name.clone(), client.clone(), api_key)
                        .with_base_url(base_url)
                        .with_model(provider_config.model.clone())
                        .with_prompt(provider_config.prompt.clone())
                        .with_max_attempts(generation.max_attempts),
                ),
                GenerationProviderType::Openai => Arc::new(
                    OpenAiClient::new(name.clone(), client.clone(), api_key)
                        .with_base_url(base_url)
                        .with_models(provider_config.model.clone(), provider_config.caption_model.clone())
                        .with_size(provider_config.size.clone())
                        .with_prompt(provider_config.prompt.clone())
                        .with_max_image_bytes(generation.max_image_bytes),
                ),
            };

            providers.push(provider);
        }

        if providers.is_empty() {
            return Err(ImageGenError::ConfigError(
                "At least one generation provider must be configured".to_string(),
            ));
        }

        let default_provider = self.config.default_provider_name().map(ToString::to_string);

        tracing::debug!(
            "Generation registry initialized with {} provider(s), default {:?}",
            providers.len(),
            default_provider
        );

        Ok(ProviderRegistry::from_clients(providers, default_provider))
    }
}

fn resolve_api_key(name: &str, config: &GenerationProviderConfig) -> Result<SecretString> {
    config.api_key.clone().ok_or_else(|| {
        ImageGenError::ConfigError(format!("API key required for generation provider '{name}'"))
    })
}
