use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    GenerationClient,
    http_client::{endpoint, error_body},
};
use crate::{
    error::{ImageGenError, Result},
    types::{GenerationPart, GenerationRequest, GenerationResponse, RetryPolicy},
};

/// Default Gemini API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default image-capable Gemini model
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Default prompt for the photo-realistic variant
pub(crate) const DEFAULT_PROMPT: &str =
    "Put this person on a cool superbike motorcycle, maintaining their appearance. Change clothes as well.";

/// Gemini `generateContent` provider
///
/// Responses frequently come back without an image (safety blocks,
/// text-only answers), so this provider retries until an image arrives.
pub(crate) struct GeminiClient {
    name: String,
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    prompt: String,
    max_attempts: u32,
}

impl GeminiClient {
    pub fn new(name: String, client: Client, api_key: SecretString) -> Self {
        Self {
            name,
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_attempts: superbike_config::DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        if let Some(prompt) = prompt {
            self.prompt = prompt;
        }
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Wire format for the `generateContent` request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: OutgoingInlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingInlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_modalities: [&'static str; 2],
}

/// Wire format for the `generateContent` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<IncomingInlineData>,
}

#[derive(Debug, Deserialize)]
struct IncomingInlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Flatten a `generateContent` response into parts
///
/// A prompt-level block yields an empty response; it is not an error.
fn into_parts(provider: &str, wire: GenerateContentResponse) -> Result<GenerationResponse> {
    if let Some(reason) = wire.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::warn!(provider, block_reason = %reason, "prompt blocked by provider");
        return Ok(GenerationResponse::empty());
    }

    let mut parts = Vec::new();

    for candidate in wire.candidates {
        if let Some(reason) = candidate.finish_reason.as_deref()
            && reason != "STOP"
        {
            tracing::warn!(provider, finish_reason = reason, "candidate finished early");
        }

        let Some(content) = candidate.content else {
            continue;
        };

        for part in content.parts {
            if let Some(text) = part.text {
                parts.push(GenerationPart::AuxiliaryText(text));
            }

            if let Some(inline) = part.inline_data {
                let bytes = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                    ImageGenError::MalformedResponse(format!("{provider}: inline image is not valid base64: {e}"))
                })?;
                parts.push(GenerationPart::InlineImage(bytes));
            }
        }
    }

    Ok(GenerationResponse::new(parts))
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::UntilImage {
            max_attempts: self.max_attempts,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let url = endpoint(&self.base_url, &format!("models/{}:generateContent", self.model));

        let mut prompt = request.prompt.clone();
        if let Some(caption) = &request.caption {
            prompt = format!("{prompt}\n\nSubject: {caption}");
        }

        let wire_request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text { text: &prompt },
                    RequestPart::Image {
                        inline_data: OutgoingInlineData {
                            mime_type: &request.source.mime_type,
                            data: STANDARD.encode(&request.source.bytes),
                        },
                    },
                ],
            }],
            generation_config: WireGenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        tracing::debug!(provider = %self.name, model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.name, error = %e, "generateContent request failed");
                ImageGenError::from_transport(&self.name, &e)
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = error_body(response).await;
            tracing::error!(provider = %self.name, status = %status, "Gemini API error");
            return Err(ImageGenError::from_status(status, error_text));
        }

        let wire_response: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "failed to parse generateContent response");
            ImageGenError::from_transport(&self.name, &e)
        })?;

        into_parts(&self.name, wire_response)
    }
}
