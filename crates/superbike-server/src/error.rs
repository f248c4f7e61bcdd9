use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use superbike_compositor::CompositeError;
use superbike_imagegen::ImageGenError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AvatarError>;

/// Failures of the upload-to-download pipeline
#[derive(Debug, Error)]
pub enum AvatarError {
    /// Upload or generated bytes are not a usable image
    #[error("Image could not be decoded: {0}")]
    Decode(String),

    /// Every attempt came back without an image
    #[error("No image after {attempts} attempts")]
    ProviderBlocked { attempts: u32 },

    /// The provider call failed outright
    #[error(transparent)]
    ProviderTransport(ImageGenError),

    /// Missing credentials, assets, or providers
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Logo or banner could not be applied
    #[error(transparent)]
    Compositing(CompositeError),

    /// Malformed upload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Background task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AvatarError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::ProviderBlocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProviderTransport(e) => e.status_code(),
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Compositing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::ProviderBlocked { .. } => "provider_blocked",
            Self::ProviderTransport(_) => "provider_error",
            Self::Configuration(_) => "configuration_error",
            Self::Compositing(_) => "compositing_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to API consumers
    pub fn client_message(&self) -> String {
        match self {
            Self::ProviderBlocked { attempts } => format!(
                "The provider returned no image after {attempts} attempts. \
                 Try a different photo with a clearly visible person, or try again later."
            ),
            Self::ProviderTransport(error) => provider_message(error),
            Self::Configuration(_) => "Server configuration error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Short label for metrics and logs
    pub const fn result_label(&self) -> &'static str {
        match self {
            Self::ProviderBlocked { .. } => "exhausted",
            Self::ProviderTransport(_) => "provider_error",
            _ => "error",
        }
    }
}

/// Uploader-facing text for a failed provider call
///
/// Upstream response bodies stay in the logs.
fn provider_message(error: &ImageGenError) -> String {
    match error {
        ImageGenError::AuthenticationFailed(_) => "The image provider rejected the server's credentials".to_string(),
        ImageGenError::ProviderApiError { status, .. } => {
            format!("The image provider returned an error (status {status}), please try again later")
        }
        ImageGenError::InvalidRequest(_) => "The image provider rejected the request".to_string(),
        ImageGenError::ConnectionError(_) => "The image provider could not be reached".to_string(),
        ImageGenError::MalformedResponse(_) => "The image provider returned an unreadable response".to_string(),
        other => other.to_string(),
    }
}

impl From<ImageGenError> for AvatarError {
    fn from(error: ImageGenError) -> Self {
        match error {
            ImageGenError::ProviderNotFound(name) => Self::InvalidRequest(format!("Unknown provider '{name}'")),
            ImageGenError::ConfigError(message) => Self::Configuration(message),
            other => Self::ProviderTransport(other),
        }
    }
}

impl From<CompositeError> for AvatarError {
    fn from(error: CompositeError) -> Self {
        match error {
            CompositeError::Decode(_) | CompositeError::UnsupportedFormat(_) => Self::Decode(error.to_string()),
            CompositeError::LogoAsset { .. } | CompositeError::FontUnavailable { .. } => {
                Self::Configuration(error.to_string())
            }
            other => Self::Compositing(other),
        }
    }
}

/// Error envelope shared by every endpoint
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: &'static str,
    code: u16,
}

impl IntoResponse for AvatarError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() || matches!(self, Self::ProviderTransport(_)) {
            tracing::error!(error = %self, "avatar request failed");
        } else {
            tracing::debug!(error = %self, "avatar request rejected");
        }

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message: self.client_message(),
                r#type: self.error_type(),
                code: status.as_u16(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(error: AvatarError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn blocked_is_unprocessable_with_guidance() {
        let (status, body) = body_json(AvatarError::ProviderBlocked { attempts: 10 }).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "provider_blocked");
        assert_eq!(body["error"]["code"], 422);
        assert!(body["error"]["message"].as_str().unwrap().contains("10 attempts"));
    }

    #[tokio::test]
    async fn configuration_details_are_not_leaked() {
        let (status, body) = body_json(AvatarError::Configuration("api key for 'photo' missing".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Server configuration error");
    }

    #[tokio::test]
    async fn upstream_error_bodies_are_not_leaked() {
        let (status, body) = body_json(AvatarError::from(ImageGenError::AuthenticationFailed(
            r#"{"error":{"message":"Incorrect API key provided: sk-live-1234"}}"#.into(),
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "provider_error");
        assert!(!body["error"]["message"].as_str().unwrap().contains("sk-live"));

        let (status, body) = body_json(AvatarError::from(ImageGenError::ProviderApiError {
            status: 429,
            message: "quota for org-internal-7 exceeded".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("429"));
        assert!(!message.contains("org-internal-7"));
    }

    #[tokio::test]
    async fn timeouts_keep_their_message() {
        let (status, body) = body_json(AvatarError::from(ImageGenError::Timeout("gemini".into()))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"]["message"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn provider_errors_map_by_kind() {
        let transport = AvatarError::from(ImageGenError::ConnectionError("refused".into()));
        assert_eq!(transport.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(transport.error_type(), "provider_error");

        let timeout = AvatarError::from(ImageGenError::Timeout("gemini".into()));
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let unknown = AvatarError::from(ImageGenError::ProviderNotFound("dalle".into()));
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

        let config = AvatarError::from(ImageGenError::ConfigError("no key".into()));
        assert_eq!(config.error_type(), "configuration_error");
    }

    #[test]
    fn compositing_errors_map_by_kind() {
        let decode = AvatarError::from(CompositeError::UnsupportedFormat("Gif".into()));
        assert_eq!(decode.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(decode.error_type(), "decode_error");

        let banner = AvatarError::from(CompositeError::EmptyBannerText);
        assert_eq!(banner.error_type(), "compositing_error");
        assert_eq!(banner.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
