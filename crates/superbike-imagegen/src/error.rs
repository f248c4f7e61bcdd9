use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Failures of a single provider call
///
/// None of these are retried. An image-less but otherwise valid response is
/// not an error here; see `GenerationOutcome`.
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Provider rejected the request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (missing or invalid API key)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider not found in configuration
    #[error("Provider '{0}' not found")]
    ProviderNotFound(String),

    /// Provider API returned an error status
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The call did not finish within the attempt timeout
    #[error("Provider call timed out: {0}")]
    Timeout(String),

    /// The provider answered with something that is not its documented format
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// A single-attempt provider answered without an image
    #[error("No image was generated: {0}")]
    NoImageReturned(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ImageGenError {
    /// HTTP status to report to the uploader
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ProviderApiError { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AuthenticationFailed(_)
            | Self::ConnectionError(_)
            | Self::MalformedResponse(_)
            | Self::NoImageReturned(_)
            | Self::ProviderApiError { .. } => StatusCode::BAD_GATEWAY,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a non-success provider status and body to an error
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed(body),
            400 => Self::InvalidRequest(body),
            code => Self::ProviderApiError { status: code, message: body },
        }
    }

    /// Map a transport failure from reqwest
    pub(crate) fn from_transport(provider: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(format!("{provider}: {error}"))
        } else if error.is_decode() {
            Self::MalformedResponse(format!("{provider}: {error}"))
        } else {
            Self::ConnectionError(format!("Failed to send request to {provider}: {error}"))
        }
    }
}
