//! Text rendering for the banner
//!
//! Fonts are resolved from an ordered candidate list. TrueType files are
//! tried first; the built-in 8x8 bitmap font always terminates the chain,
//! so resolution cannot fail.

mod bitmap;
mod truetype;

use std::path::PathBuf;
use std::sync::Arc;

use image::{Rgb, RgbImage};

pub use bitmap::BitmapFont;
pub use truetype::TrueTypeFont;

/// Size of the inked area of a rendered string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// A font able to measure and draw a single line of text
pub trait GlyphRenderer: Send + Sync {
    /// Human-readable font name for logs
    fn name(&self) -> &str;

    /// Measure the ink box of `text` at `size` pixels
    fn measure(&self, text: &str, size: u32) -> TextExtent;

    /// Draw `text` so that its ink box starts at `origin`
    ///
    /// `origin` may lie outside the canvas; pixels falling outside are
    /// clipped.
    fn draw(&self, canvas: &mut RgbImage, text: &str, size: u32, origin: (i64, i64), color: Rgb<u8>);
}

/// Ordered list of TrueType font files tried before the built-in font
#[derive(Debug, Clone, Default)]
pub struct FontChain {
    candidates: Vec<PathBuf>,
}

impl FontChain {
    pub fn new(candidates: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
        }
    }

    /// A chain that goes straight to the built-in bitmap font
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// Return the first candidate that loads
    pub fn resolve(&self) -> Arc<dyn GlyphRenderer> {
        for path in &self.candidates {
            match TrueTypeFont::load(path) {
                Ok(font) => {
                    tracing::debug!(font = %path.display(), "resolved banner font");
                    return Arc::new(font);
                }
                Err(e) => {
                    tracing::debug!(font = %path.display(), error = %e, "font candidate unavailable");
                }
            }
        }

        tracing::info!("no TrueType banner font available, using built-in bitmap font");
        Arc::new(BitmapFont)
    }
}

/// Blend `color` into the pixel at (`x`, `y`) with `coverage` in 0..=1
pub(crate) fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };

    if x >= canvas.width() || y >= canvas.height() || coverage <= 0.0 {
        return;
    }

    let coverage = coverage.min(1.0);
    let dst = canvas.get_pixel_mut(x, y);

    for (d, s) in dst.0.iter_mut().zip(color.0) {
        let mixed = f32::from(s).mul_add(coverage, f32::from(*d) * (1.0 - coverage));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            *d = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}
