use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::error::{CompositeError, Result};

/// Share of the base image width taken by the logo
pub const LOGO_WIDTH_RATIO: f64 = 0.15;

/// Decoded brand logo, shared read-only between requests
#[derive(Debug, Clone)]
pub struct LogoAsset {
    image: Arc<DynamicImage>,
}

impl LogoAsset {
    /// Read and decode the logo file
    pub fn load(path: &Path) -> Result<Self> {
        let unusable = |reason: String| CompositeError::LogoAsset {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| unusable(e.to_string()))?;
        let image = image::load_from_memory(&bytes).map_err(|e| unusable(e.to_string()))?;

        tracing::debug!(
            logo = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded logo asset"
        );

        Ok(Self::from_image(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image: Arc::new(image) }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Size of the logo once fitted to a base image of `base_width`
///
/// Width is 15% of the base width; height follows the logo's own aspect
/// ratio. Both are at least one pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn logo_dimensions(base_width: u32, logo_width: u32, logo_height: u32) -> (u32, u32) {
    let width = (f64::from(base_width) * LOGO_WIDTH_RATIO).round().max(1.0);
    let height = (f64::from(logo_height) * width / f64::from(logo_width.max(1))).round().max(1.0);

    (width as u32, height as u32)
}

/// Paste `logo` at (`padding`, `padding`) over a copy of `base`
///
/// The logo is Lanczos-resampled to [`logo_dimensions`] and composited
/// through its alpha channel; logos without alpha are opaque. The result is
/// opaque RGB with the dimensions of `base`.
pub fn place_logo(base: &DynamicImage, logo: &DynamicImage, padding: u32) -> RgbImage {
    let (logo_width, logo_height) = logo_dimensions(base.width(), logo.width(), logo.height());
    let resized = imageops::resize(&logo.to_rgba8(), logo_width, logo_height, FilterType::Lanczos3);

    let mut canvas = base.to_rgba8();
    imageops::overlay(&mut canvas, &resized, i64::from(padding), i64::from(padding));

    DynamicImage::ImageRgba8(canvas).into_rgb8()
}
