use std::fmt;

/// Photo sent to the provider, in its uploaded encoding
#[derive(Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    /// `image/png` or `image/jpeg`
    pub mime_type: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// File name matching the MIME type, for multipart uploads
    pub fn file_name(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "image.jpg",
            _ => "image.png",
        }
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// One image-generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub source: SourceImage,
    pub prompt: String,
    /// Description of the subject produced by a preceding captioning call
    pub caption: Option<String>,
}

/// One part of a provider response
#[derive(Clone, PartialEq, Eq)]
pub enum GenerationPart {
    /// Decoded image bytes
    InlineImage(Vec<u8>),
    /// Location the image can be fetched from
    RemoteUrl(String),
    /// Commentary, refusal text, or any other non-image output
    AuxiliaryText(String),
}

impl fmt::Debug for GenerationPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InlineImage(bytes) => write!(f, "InlineImage({} bytes)", bytes.len()),
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
            Self::AuxiliaryText(text) => f.debug_tuple("AuxiliaryText").field(text).finish(),
        }
    }
}

/// All parts returned by one provider call; no parts means an empty response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub parts: Vec<GenerationPart>,
}

impl GenerationResponse {
    pub fn new(parts: Vec<GenerationPart>) -> Self {
        Self { parts }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// First inline image anywhere in the response
    pub fn into_inline_image(self) -> Option<Vec<u8>> {
        self.parts.into_iter().find_map(|part| match part {
            GenerationPart::InlineImage(bytes) => Some(bytes),
            _ => None,
        })
    }

    /// Concatenated auxiliary text, for logs
    pub fn text(&self) -> Option<String> {
        let text: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                GenerationPart::AuxiliaryText(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        (!text.is_empty()).then(|| text.join(" "))
    }
}

/// How a provider's image-less responses are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Call again until an image arrives or the budget is spent
    UntilImage { max_attempts: u32 },
    /// One call; an image-less response is an error
    SingleAttempt,
}

/// What a single attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Image,
    NoContent,
    Error,
}

impl AttemptOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::NoContent => "no_content",
            Self::Error => "error",
        }
    }
}

/// Progress record for one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// 1-based attempt number
    pub ordinal: u32,
    pub max_attempts: u32,
    pub outcome: AttemptOutcome,
}

/// Terminal state of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// An image arrived on attempt `attempts`
    Succeeded { image: Vec<u8>, attempts: u32 },
    /// Every attempt came back without an image
    Exhausted { attempts: u32 },
}

impl GenerationOutcome {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_image_is_found_after_other_parts() {
        let response = GenerationResponse::new(vec![
            GenerationPart::AuxiliaryText("here you go".into()),
            GenerationPart::RemoteUrl("https://example.com/a.png".into()),
            GenerationPart::InlineImage(vec![1, 2, 3]),
            GenerationPart::InlineImage(vec![4]),
        ]);

        assert_eq!(response.text().as_deref(), Some("here you go"));
        assert_eq!(response.into_inline_image(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn text_and_urls_are_not_images() {
        let response = GenerationResponse::new(vec![
            GenerationPart::AuxiliaryText("I can't help with that".into()),
            GenerationPart::RemoteUrl("https://example.com/a.png".into()),
        ]);
        assert_eq!(response.into_inline_image(), None);
        assert_eq!(GenerationResponse::empty().text(), None);
    }

    #[test]
    fn source_file_name_follows_mime() {
        assert_eq!(SourceImage::new(vec![], "image/jpeg").file_name(), "image.jpg");
        assert_eq!(SourceImage::new(vec![], "image/png").file_name(), "image.png");
    }

    #[test]
    fn debug_hides_payloads() {
        let part = GenerationPart::InlineImage(vec![0; 2048]);
        assert_eq!(format!("{part:?}"), "InlineImage(2048 bytes)");
    }
}
