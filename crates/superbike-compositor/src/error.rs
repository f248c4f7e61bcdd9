use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompositeError>;

/// Errors raised while decoding, compositing, or encoding images
#[derive(Debug, Error)]
pub enum CompositeError {
    /// Bytes are not a decodable image
    #[error("image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    /// Decodable, but not one of the accepted upload formats
    #[error("unsupported image format {0}, expected PNG or JPEG")]
    UnsupportedFormat(String),

    /// The composited image could not be encoded
    #[error("image could not be encoded: {0}")]
    Encode(#[source] image::ImageError),

    /// The logo file is missing or not an image
    #[error("logo asset {path} is unusable: {reason}")]
    LogoAsset { path: PathBuf, reason: String },

    /// A font candidate could not be loaded
    #[error("font {path} is unusable: {reason}")]
    FontUnavailable { path: PathBuf, reason: String },

    /// Banner text must contain at least one visible character
    #[error("banner text must not be empty")]
    EmptyBannerText,
}
