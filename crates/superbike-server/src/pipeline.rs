use std::sync::Arc;
use std::time::Instant;

use image::{GenericImageView, Rgb};
use superbike_compositor::{BannerSpec, Compositor, FontChain, LogoAsset, decode_upload, upload_mime_type};
use superbike_config::Config;
use superbike_imagegen::{
    AttemptObserver, GenerationAttempt, GenerationOutcome, ProviderRegistry, ProviderRegistryBuilder, SourceImage,
};
use superbike_telemetry::metrics::PipelineMetrics;

use crate::error::{AvatarError, Result};

/// A finished, branded avatar
#[derive(Debug)]
pub struct Avatar {
    /// PNG bytes
    pub png: Vec<u8>,
    /// Provider that generated the image
    pub provider: String,
    /// Provider calls it took
    pub attempts: u32,
}

/// Upload photo in, branded PNG out
///
/// Holds everything resolved at startup (providers, logo, font) and is
/// shared read-only between requests.
#[derive(Clone)]
pub struct AvatarPipeline {
    registry: Arc<ProviderRegistry>,
    compositor: Compositor,
    metrics: PipelineMetrics,
}

impl AvatarPipeline {
    pub fn new(registry: Arc<ProviderRegistry>, compositor: Compositor) -> Self {
        Self {
            registry,
            compositor,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Build providers, load the logo, and resolve the banner font
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = ProviderRegistryBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize generation providers: {e}"))?;

        let compositor = build_compositor(config)?;

        Ok(Self::new(Arc::new(registry), compositor))
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Generate, brand, and encode an avatar for `photo`
    ///
    /// `provider` selects a configured provider by name; `None` uses the
    /// default. `observer` sees every generation attempt.
    pub async fn run(
        &self,
        photo: Vec<u8>,
        provider: Option<&str>,
        observer: &mut dyn AttemptObserver,
    ) -> Result<Avatar> {
        let mime_type = upload_mime_type(&photo)
            .ok_or_else(|| AvatarError::Decode("upload is not a PNG or JPEG image".to_string()))?;

        let (photo, (width, height)) = tokio::task::spawn_blocking(move || {
            let dimensions = decode_upload(&photo)?.dimensions();
            Ok::<_, AvatarError>((photo, dimensions))
        })
        .await
        .map_err(|e| AvatarError::Internal(format!("upload decoding task failed: {e}")))??;

        let client = self.registry.resolve(provider)?;
        let provider = client.name().to_string();

        tracing::info!(provider = %provider, width, height, mime_type, "generating avatar");

        let start = Instant::now();
        let mut observer = MeteredObserver {
            provider: &provider,
            metrics: &self.metrics,
            inner: observer,
        };

        let generation = self
            .registry
            .generate(Some(&provider), SourceImage::new(photo, mime_type), &mut observer)
            .await
            .map_err(AvatarError::from);

        let (image, attempts) = match generation {
            Ok(generation) => match generation.outcome {
                GenerationOutcome::Succeeded { image, attempts } => (image, attempts),
                GenerationOutcome::Exhausted { attempts } => {
                    let error = AvatarError::ProviderBlocked { attempts };
                    self.metrics.record_request(&provider, error.result_label(), start);
                    return Err(error);
                }
            },
            Err(error) => {
                self.metrics.record_request(&provider, error.result_label(), start);
                return Err(error);
            }
        };

        let png = self.composite(image).await;
        let result = match &png {
            Ok(_) => "success",
            Err(error) => error.result_label(),
        };
        self.metrics.record_request(&provider, result, start);

        Ok(Avatar {
            png: png?,
            provider,
            attempts,
        })
    }

    /// Decode the generated bytes and apply logo and banner off the reactor
    async fn composite(&self, generated: Vec<u8>) -> Result<Vec<u8>> {
        let compositor = self.compositor.clone();
        let start = Instant::now();

        let png = tokio::task::spawn_blocking(move || compositor.compose_png(&generated))
            .await
            .map_err(|e| AvatarError::Internal(format!("compositing task failed: {e}")))?
            .map_err(AvatarError::from)?;

        self.metrics.record_composite(start);
        tracing::debug!(bytes = png.len(), "avatar composited");

        Ok(png)
    }
}

impl std::fmt::Debug for AvatarPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarPipeline")
            .field("providers", &self.registry.names().collect::<Vec<_>>())
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}

/// Load branding assets into a compositor
fn build_compositor(config: &Config) -> anyhow::Result<Compositor> {
    let branding = &config.branding;

    let logo_path = branding
        .logo_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("branding.logo_path must be set"))?;
    let logo = LogoAsset::load(logo_path)?;

    let renderer = FontChain::new(branding.fonts.iter().cloned()).resolve();
    tracing::info!(font = renderer.name(), "banner font resolved");

    let banner = BannerSpec::new(
        branding.banner_text.clone(),
        Rgb(branding.ribbon_color.0),
        Rgb(branding.text_color.0),
    );

    Ok(Compositor::new(logo, branding.logo_padding, banner, renderer))
}

/// Feeds attempt outcomes into metrics before forwarding them
struct MeteredObserver<'a> {
    provider: &'a str,
    metrics: &'a PipelineMetrics,
    inner: &'a mut dyn AttemptObserver,
}

impl AttemptObserver for MeteredObserver<'_> {
    fn attempt_started(&mut self, ordinal: u32, max_attempts: u32) {
        self.inner.attempt_started(ordinal, max_attempts);
    }

    fn attempt_finished(&mut self, attempt: &GenerationAttempt) {
        self.metrics.record_attempt(self.provider, attempt.outcome.as_str());
        self.inner.attempt_finished(attempt);
    }
}
