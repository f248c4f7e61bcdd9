use std::path::Path;

use image::{Rgb, RgbImage};
use rusttype::{Font, Point, Rect, Scale, point};

use super::{GlyphRenderer, TextExtent, blend_pixel};
use crate::error::{CompositeError, Result};

/// A TrueType/OpenType font loaded from disk
pub struct TrueTypeFont {
    name: String,
    font: Font<'static>,
}

impl TrueTypeFont {
    /// Load and parse a font file
    pub fn load(path: &Path) -> Result<Self> {
        let unusable = |reason: String| CompositeError::FontUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| unusable(e.to_string()))?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| unusable("not a TrueType font".to_string()))?;

        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

        Ok(Self { name, font })
    }

    /// Union of glyph pixel boxes for `text` laid out from `start`
    fn ink_bounds(&self, text: &str, scale: Scale, start: Point<f32>) -> Option<Rect<i32>> {
        self.font
            .layout(text, scale, start)
            .filter_map(|glyph| glyph.pixel_bounding_box())
            .reduce(|acc, bb| Rect {
                min: point(acc.min.x.min(bb.min.x), acc.min.y.min(bb.min.y)),
                max: point(acc.max.x.max(bb.max.x), acc.max.y.max(bb.max.y)),
            })
    }

    fn baseline_start(&self, scale: Scale) -> Point<f32> {
        point(0.0, self.font.v_metrics(scale).ascent)
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale_for(size: u32) -> Scale {
    Scale::uniform(size as f32)
}

impl GlyphRenderer for TrueTypeFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, text: &str, size: u32) -> TextExtent {
        let scale = scale_for(size);

        self.ink_bounds(text, scale, self.baseline_start(scale))
            .map(|bb| TextExtent {
                width: bb.width().unsigned_abs(),
                height: bb.height().unsigned_abs(),
            })
            .unwrap_or_default()
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw(&self, canvas: &mut RgbImage, text: &str, size: u32, origin: (i64, i64), color: Rgb<u8>) {
        let scale = scale_for(size);
        let start = self.baseline_start(scale);

        let Some(bounds) = self.ink_bounds(text, scale, start) else {
            return;
        };

        // Whole-pixel shift keeps every glyph box identical to the measured one
        let shifted = point(
            start.x + (origin.0 - i64::from(bounds.min.x)) as f32,
            start.y + (origin.1 - i64::from(bounds.min.y)) as f32,
        );

        for glyph in self.font.layout(text, scale, shifted) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };

            glyph.draw(|gx, gy, coverage| {
                let x = i64::from(bb.min.x) + i64::from(gx);
                let y = i64::from(bb.min.y) + i64::from(gy);
                blend_pixel(canvas, x, y, color, coverage);
            });
        }
    }
}
