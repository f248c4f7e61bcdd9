use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{CompositeError, Result};
use crate::font::{GlyphRenderer, TextExtent};

/// Smallest banner font size in pixels
pub const MIN_FONT_SIZE: u32 = 16;

/// Share of the image width used as font size
pub const FONT_SIZE_RATIO: f64 = 0.025;

/// Vertical padding around the text, split evenly above and below
pub const RIBBON_PADDING: u32 = 20;

/// Text and colors for the bottom ribbon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerSpec {
    pub text: String,
    pub ribbon_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
}

impl BannerSpec {
    pub fn new(text: impl Into<String>, ribbon_color: Rgb<u8>, text_color: Rgb<u8>) -> Self {
        Self {
            text: text.into(),
            ribbon_color,
            text_color,
        }
    }
}

/// Geometry of the ribbon and its text for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerLayout {
    pub font_size: u32,
    pub text: TextExtent,
    pub ribbon_top: u32,
    pub ribbon_height: u32,
    /// Left edge of the text ink; negative when the text is wider than the image
    pub text_x: i64,
    pub text_y: i64,
}

/// Font size for an image of `width` pixels: 2.5% of the width, at least 16
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn font_size_for_width(width: u32) -> u32 {
    let proportional = (f64::from(width) * FONT_SIZE_RATIO).round() as u32;
    proportional.max(MIN_FONT_SIZE)
}

/// Compute where the ribbon and text go on a `width` x `height` image
pub fn layout_banner(width: u32, height: u32, text: &str, renderer: &dyn GlyphRenderer) -> BannerLayout {
    let font_size = font_size_for_width(width);
    let extent = renderer.measure(text, font_size);

    let ribbon_height = extent.height.saturating_add(RIBBON_PADDING);
    let ribbon_top = height.saturating_sub(ribbon_height);

    let text_x = (i64::from(width) - i64::from(extent.width)).div_euclid(2);
    let text_y = i64::from(ribbon_top) + (i64::from(ribbon_height) - i64::from(extent.height)).div_euclid(2);

    BannerLayout {
        font_size,
        text: extent,
        ribbon_top,
        ribbon_height,
        text_x,
        text_y,
    }
}

/// Draw a full-width ribbon with centered text along the bottom edge
///
/// Works on an opaque copy of `base`; rows above the ribbon are left
/// untouched. Text wider than the image is drawn off-center and clipped.
pub fn add_bottom_banner(
    base: &DynamicImage,
    banner: &BannerSpec,
    renderer: &dyn GlyphRenderer,
) -> Result<RgbImage> {
    if banner.text.trim().is_empty() {
        return Err(CompositeError::EmptyBannerText);
    }

    let mut canvas = base.to_rgb8();
    let (width, height) = canvas.dimensions();
    let layout = layout_banner(width, height, &banner.text, renderer);

    tracing::trace!(
        font = renderer.name(),
        font_size = layout.font_size,
        ribbon_height = layout.ribbon_height,
        text_width = layout.text.width,
        "drawing bottom banner"
    );

    for y in layout.ribbon_top..height {
        for x in 0..width {
            canvas.put_pixel(x, y, banner.ribbon_color);
        }
    }

    renderer.draw(
        &mut canvas,
        &banner.text,
        layout.font_size,
        (layout.text_x, layout.text_y),
        banner.text_color,
    );

    Ok(canvas)
}
