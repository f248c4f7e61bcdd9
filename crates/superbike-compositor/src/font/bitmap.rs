use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

use super::{GlyphRenderer, TextExtent, blend_pixel};

/// Native glyph cell edge in pixels
const CELL: u32 = 8;

/// Built-in 8x8 bitmap font, scaled by whole pixels to approximate a size
///
/// The ink box is the full cell run: `chars * 8 * scale` by `8 * scale`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    /// Integer magnification closest to the requested pixel size
    pub fn scale_for(size: u32) -> u32 {
        ((size + CELL / 2) / CELL).max(1)
    }

    fn glyph(ch: char) -> [u8; 8] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }
}

impl GlyphRenderer for BitmapFont {
    fn name(&self) -> &str {
        "builtin-8x8"
    }

    fn measure(&self, text: &str, size: u32) -> TextExtent {
        let cell = CELL * Self::scale_for(size);
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);

        TextExtent {
            width: chars.saturating_mul(cell),
            height: cell,
        }
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, size: u32, origin: (i64, i64), color: Rgb<u8>) {
        let scale = i64::from(Self::scale_for(size));
        let cell = i64::from(CELL) * scale;
        let (origin_x, origin_y) = origin;

        for (index, ch) in (0_i64..).zip(text.chars()) {
            let glyph_x = origin_x + index * cell;

            // Bit 0 of each row byte is the leftmost pixel
            for (row, bits) in (0_i64..).zip(Self::glyph(ch)) {
                for col in 0..8 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }

                    let x = glyph_x + i64::from(col) * scale;
                    let y = origin_y + row * scale;

                    for dy in 0..scale {
                        for dx in 0..scale {
                            blend_pixel(canvas, x + dx, y + dy, color, 1.0);
                        }
                    }
                }
            }
        }
    }
}
