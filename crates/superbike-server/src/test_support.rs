use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use superbike_compositor::{BannerSpec, Compositor, LogoAsset, font::BitmapFont};
use superbike_imagegen::{
    GenerationClient, GenerationPart, GenerationRequest, GenerationResponse, ImageGenError, ProviderRegistry,
    RetryPolicy,
};

use crate::AvatarPipeline;

pub(crate) enum Behavior {
    Image(Vec<u8>),
    Empty,
    Fail,
}

/// Provider double that answers every call the same way
pub(crate) struct StubClient {
    behavior: Behavior,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl GenerationClient for StubClient {
    fn name(&self) -> &str {
        "stub"
    }

    fn prompt(&self) -> &str {
        "ride"
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::UntilImage { max_attempts: 10 }
    }

    async fn generate(&self, _request: &GenerationRequest) -> superbike_imagegen::Result<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Image(bytes) => Ok(GenerationResponse::new(vec![GenerationPart::InlineImage(bytes.clone())])),
            Behavior::Empty => Ok(GenerationResponse::empty()),
            Behavior::Fail => Err(ImageGenError::ConnectionError("refused".into())),
        }
    }
}

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 90, 90])))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Pipeline over a single stub provider, with a call counter
pub(crate) fn stub_pipeline(behavior: Behavior) -> (AvatarPipeline, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let client: Arc<dyn GenerationClient> = Arc::new(StubClient {
        behavior,
        calls: Arc::clone(&calls),
    });
    let registry = ProviderRegistry::from_clients(vec![client], None);

    let logo = LogoAsset::from_image(DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]))));
    let banner = BannerSpec::new("TEST", Rgb([255, 215, 0]), Rgb([255, 0, 0]));
    let compositor = Compositor::new(logo, 10, banner, Arc::new(BitmapFont));

    (AvatarPipeline::new(Arc::new(registry), compositor), calls)
}
