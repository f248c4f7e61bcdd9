//! Logo and banner compositing for generated avatars
//!
//! Every operation borrows its inputs and returns a new opaque RGB image.
//! The standard pipeline is [`Compositor::compose`]: logo first, then the
//! bottom banner.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod banner;
mod codec;
mod error;
pub mod font;
mod logo;

use std::sync::Arc;

use image::{DynamicImage, RgbImage};

pub use banner::{
    BannerLayout, BannerSpec, FONT_SIZE_RATIO, MIN_FONT_SIZE, RIBBON_PADDING, add_bottom_banner, font_size_for_width,
    layout_banner,
};
pub use codec::{decode_generated, decode_upload, encode_png, upload_mime_type};
pub use error::{CompositeError, Result};
pub use font::{FontChain, GlyphRenderer, TextExtent};
pub use logo::{LOGO_WIDTH_RATIO, LogoAsset, logo_dimensions, place_logo};

/// Logo, banner, and resolved font bundled for repeated use
#[derive(Clone)]
pub struct Compositor {
    logo: LogoAsset,
    logo_padding: u32,
    banner: BannerSpec,
    renderer: Arc<dyn GlyphRenderer>,
}

impl Compositor {
    pub fn new(logo: LogoAsset, logo_padding: u32, banner: BannerSpec, renderer: Arc<dyn GlyphRenderer>) -> Self {
        Self {
            logo,
            logo_padding,
            banner,
            renderer,
        }
    }

    /// Paste the logo, then the bottom banner
    pub fn compose(&self, image: &DynamicImage) -> Result<RgbImage> {
        let with_logo = place_logo(image, self.logo.image(), self.logo_padding);
        add_bottom_banner(&DynamicImage::ImageRgb8(with_logo), &self.banner, self.renderer.as_ref())
    }

    /// Decode provider bytes, compose, and encode the PNG download
    pub fn compose_png(&self, generated: &[u8]) -> Result<Vec<u8>> {
        let decoded = decode_generated(generated)?;
        encode_png(&self.compose(&decoded)?)
    }

    pub fn font_name(&self) -> &str {
        self.renderer.name()
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("logo_padding", &self.logo_padding)
            .field("banner", &self.banner)
            .field("font", &self.renderer.name())
            .finish_non_exhaustive()
    }
}
