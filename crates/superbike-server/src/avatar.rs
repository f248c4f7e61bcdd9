use axum::{
    body::Body,
    extract::{FromRequest, Multipart, State},
    response::{IntoResponse, Response},
};
use http::{HeaderValue, StatusCode, header};
use superbike_imagegen::{AttemptObserver, AttemptOutcome, GenerationAttempt};

use crate::{
    AppState,
    error::{AvatarError, Result},
};

/// Response header carrying the number of provider calls
pub const ATTEMPTS_HEADER: &str = "x-generation-attempts";

/// Response header naming the provider that produced the image
pub const PROVIDER_HEADER: &str = "x-generation-provider";

/// Multipart upload: a `file` photo and an optional `provider` name
#[derive(Debug)]
pub struct AvatarUpload {
    pub photo: Vec<u8>,
    pub provider: Option<String>,
}

impl<S> FromRequest<S> for AvatarUpload
where
    S: Send + Sync,
{
    type Rejection = AvatarError;

    async fn from_request(request: http::Request<Body>, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("multipart/form-data") {
            return Err(AvatarError::InvalidRequest(
                "Unsupported Content-Type, expected: 'Content-Type: multipart/form-data'".to_string(),
            ));
        }

        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AvatarError::InvalidRequest(format!("Failed to parse multipart form: {e}")))?;

        let mut photo: Option<Vec<u8>> = None;
        let mut provider: Option<String> = None;

        loop {
            let field = multipart
                .next_field()
                .await
                .map_err(|e| AvatarError::InvalidRequest(format!("Failed to read multipart form: {e}")))?;

            let Some(field) = field else {
                break;
            };

            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "file" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AvatarError::InvalidRequest(format!("Failed to read image data: {e}")))?;
                    photo = Some(bytes.to_vec());
                }
                "provider" => {
                    let name = field
                        .text()
                        .await
                        .map_err(|e| AvatarError::InvalidRequest(format!("Failed to read provider field: {e}")))?;
                    provider = Some(name.trim().to_string()).filter(|n| !n.is_empty());
                }
                _ => {
                    // Skip unknown fields
                }
            }
        }

        let photo = photo
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AvatarError::InvalidRequest("Missing required 'file' field in multipart form".to_string()))?;

        Ok(Self { photo, provider })
    }
}

/// Logs each attempt of a request as it finishes
struct LoggingObserver;

impl AttemptObserver for LoggingObserver {
    fn attempt_finished(&mut self, attempt: &GenerationAttempt) {
        if attempt.outcome == AttemptOutcome::NoContent {
            tracing::info!(
                attempt = attempt.ordinal,
                max_attempts = attempt.max_attempts,
                "no image yet, retrying"
            );
        }
    }
}

/// Handle `POST /v1/avatars`
pub(crate) async fn create_avatar(State(state): State<AppState>, upload: AvatarUpload) -> Result<Response> {
    tracing::debug!(bytes = upload.photo.len(), provider = ?upload.provider, "avatar upload received");

    let avatar = state
        .pipeline
        .run(upload.photo, upload.provider.as_deref(), &mut LoggingObserver)
        .await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", state.download_filename))
        .map_err(|e| AvatarError::Configuration(format!("download filename is not a valid header: {e}")))?;
    let provider = HeaderValue::from_str(&avatar.provider)
        .map_err(|e| AvatarError::Configuration(format!("provider name is not a valid header: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static(ATTEMPTS_HEADER), HeaderValue::from(avatar.attempts)),
            (header::HeaderName::from_static(PROVIDER_HEADER), provider),
        ],
        avatar.png,
    )
        .into_response())
}
