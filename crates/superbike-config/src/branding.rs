use std::{fmt, path::PathBuf, str::FromStr};

use serde::Deserialize;

/// Logo and banner overlay configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandingConfig {
    /// Logo image pasted in the top-left corner
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    /// Distance in pixels between the logo and the image edges
    #[serde(default = "default_logo_padding")]
    pub logo_padding: u32,
    /// Text drawn on the bottom ribbon
    #[serde(default = "default_banner_text")]
    pub banner_text: String,
    /// Ribbon fill color
    #[serde(default = "default_ribbon_color")]
    pub ribbon_color: HexColor,
    /// Banner text color
    #[serde(default = "default_text_color")]
    pub text_color: HexColor,
    /// TrueType fonts tried in order before the built-in bitmap font
    #[serde(default = "default_fonts")]
    pub fonts: Vec<PathBuf>,
    /// File name offered for the download
    #[serde(default = "default_download_filename")]
    pub download_filename: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            logo_path: None,
            logo_padding: default_logo_padding(),
            banner_text: default_banner_text(),
            ribbon_color: default_ribbon_color(),
            text_color: default_text_color(),
            fonts: default_fonts(),
            download_filename: default_download_filename(),
        }
    }
}

/// Opaque RGB color written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HexColor(pub [u8; 3]);

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');

        if digits.len() != 6 || !digits.is_ascii() {
            return Err(format!("invalid color '{s}', expected #RRGGBB"));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| format!("invalid color '{s}', expected #RRGGBB"))
        };

        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_logo_padding() -> u32 {
    10
}

fn default_banner_text() -> String {
    "Buy Yellow Diamond Rings to make your Super Bike Avatar".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_ribbon_color() -> HexColor {
    HexColor([255, 215, 0])
}

#[allow(clippy::missing_const_for_fn)]
fn default_text_color() -> HexColor {
    HexColor([255, 0, 0])
}

fn default_fonts() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
    ]
}

fn default_download_filename() -> String {
    "person_on_superbike.png".to_string()
}
