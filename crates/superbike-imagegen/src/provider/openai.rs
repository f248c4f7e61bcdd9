use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    GenerationClient,
    http_client::{endpoint, error_body},
};
use crate::{
    error::{ImageGenError, Result},
    types::{GenerationPart, GenerationRequest, GenerationResponse, RetryPolicy, SourceImage},
};

/// Default `OpenAI` API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default image edit model
pub(crate) const DEFAULT_MODEL: &str = "gpt-image-1";

/// Default vision model used to describe the subject
pub(crate) const DEFAULT_CAPTION_MODEL: &str = "gpt-4o";

/// Default edit output size
pub(crate) const DEFAULT_SIZE: &str = "1024x1024";

/// Token cap for the subject description
const CAPTION_MAX_TOKENS: u32 = 300;

/// Instruction for the subject description call
pub(crate) const CAPTION_PROMPT: &str = "Analyze this image and provide a detailed description of the child/kid in the image. \
Include details about their appearance, clothing, age, hair color, skin tone, facial features, and any distinctive characteristics. \
Be very specific and detailed. Focus only on describing the child's appearance accurately.";

/// Default prompt for the cartoon variant
pub(crate) const DEFAULT_PROMPT: &str = "Transform this photo into a fun, colorful cartoon illustration in Pixar/Disney animation style. \
The animated character should be riding an awesome, stylized superbike motorcycle. \
Bright colors, friendly cartoon style, fun and playful mood. \
High quality digital illustration, smooth gradients, appealing character design.";

/// `OpenAI` caption-then-edit provider
///
/// The edit call is made once; a response without an image is an error.
pub(crate) struct OpenAiClient {
    name: String,
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    caption_model: String,
    size: String,
    prompt: String,
    max_image_bytes: usize,
}

impl OpenAiClient {
    pub fn new(name: String, client: Client, api_key: SecretString) -> Self {
        Self {
            name,
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_image_bytes: superbike_config::DEFAULT_MAX_IMAGE_BYTES,
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
    pub fn with_models(mut self, model: Option<String>, caption_model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(caption_model) = caption_model {
            self.caption_model = caption_model;
        }
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: Option<String>) -> Self {
        if let Some(size) = size {
            self.size = size;
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
    pub const fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    async fn check(&self, response: reqwest::Response, call: &str) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = error_body(response).await;
        tracing::error!(provider = %self.name, status = %status, call, "OpenAI API error");
        Err(ImageGenError::from_status(status, error_text))
    }

    /// Download an image the edit endpoint returned by reference
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(provider = %self.name, "downloading generated image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageGenError::from_transport(&self.name, &e))?;

        let mut response = self.check(response, "image download").await?;

        if let Some(declared) = response.content_length() {
            ensure_within_limit(&self.name, usize::try_from(declared).unwrap_or(usize::MAX), self.max_image_bytes)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageGenError::from_transport(&self.name, &e))?
        {
            ensure_within_limit(&self.name, bytes.len() + chunk.len(), self.max_image_bytes)?;
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

/// Wire format for the captioning request
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ChatContent<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatContent<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Wire format for the image edit response
#[derive(Deserialize)]
struct EditResponse {
    #[serde(default)]
    data: Vec<EditImage>,
}

#[derive(Deserialize)]
struct EditImage {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Refuse downloads larger than `limit` bytes
fn ensure_within_limit(provider: &str, len: usize, limit: usize) -> Result<()> {
    if len > limit {
        tracing::error!(provider, len, limit, "generated image download too large");
        return Err(ImageGenError::MalformedResponse(format!(
            "{provider}: generated image is larger than {limit} bytes"
        )));
    }
    Ok(())
}

fn data_uri(source: &SourceImage) -> String {
    format!("data:{};base64,{}", source.mime_type, STANDARD.encode(&source.bytes))
}

fn caption_request<'a>(model: &'a str, source: &SourceImage) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ChatContent::Text { text: CAPTION_PROMPT },
                ChatContent::ImageUrl {
                    image_url: ImageUrl { url: data_uri(source) },
                },
            ],
        }],
        max_tokens: CAPTION_MAX_TOKENS,
    }
}

/// Edit prompt with the subject description appended
fn edit_prompt(prompt: &str, caption: Option<&str>) -> String {
    match caption {
        Some(caption) if !caption.trim().is_empty() => {
            format!("{prompt}\n\nThe character should match this description: {caption}")
        }
        _ => prompt.to_string(),
    }
}

/// First image of an edit response, as a part
fn first_image(provider: &str, wire: EditResponse) -> Result<Option<GenerationPart>> {
    let Some(image) = wire.data.into_iter().next() else {
        return Ok(None);
    };

    if let Some(encoded) = image.b64_json.filter(|s| !s.is_empty()) {
        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            ImageGenError::MalformedResponse(format!("{provider}: b64_json is not valid base64: {e}"))
        })?;
        return Ok(Some(GenerationPart::InlineImage(bytes)));
    }

    Ok(image.url.filter(|s| !s.is_empty()).map(GenerationPart::RemoteUrl))
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::SingleAttempt
    }

    async fn describe(&self, source: &SourceImage) -> Result<Option<String>> {
        let url = endpoint(&self.base_url, "chat/completions");

        tracing::debug!(provider = %self.name, model = %self.caption_model, "describing subject");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&caption_request(&self.caption_model, source))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.name, error = %e, "captioning request failed");
                ImageGenError::from_transport(&self.name, &e)
            })?;

        let wire: ChatResponse = self
            .check(response, "chat/completions")
            .await?
            .json()
            .await
            .map_err(|e| ImageGenError::from_transport(&self.name, &e))?;

        let caption = wire
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                ImageGenError::MalformedResponse(format!("{}: captioning response had no text", self.name))
            })?;

        tracing::debug!(provider = %self.name, caption_len = caption.len(), "subject described");

        Ok(Some(caption))
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let url = endpoint(&self.base_url, "images/edits");
        let prompt = edit_prompt(&request.prompt, request.caption.as_deref());

        let image = Part::bytes(request.source.bytes.clone())
            .file_name(request.source.file_name())
            .mime_str(&request.source.mime_type)
            .map_err(|e| ImageGenError::InvalidRequest(format!("unsupported upload type: {e}")))?;

        let form = Form::new()
            .text("model", self.model.clone())
            .part("image", image)
            .text("prompt", prompt)
            .text("size", self.size.clone());

        tracing::debug!(provider = %self.name, model = %self.model, size = %self.size, "sending image edit request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.name, error = %e, "image edit request failed");
                ImageGenError::from_transport(&self.name, &e)
            })?;

        let wire: EditResponse = self
            .check(response, "images/edits")
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.name, error = %e, "failed to parse image edit response");
                ImageGenError::from_transport(&self.name, &e)
            })?;

        let part = match first_image(&self.name, wire)? {
            Some(GenerationPart::RemoteUrl(url)) => Some(GenerationPart::InlineImage(self.fetch(&url).await?)),
            other => other,
        };

        Ok(GenerationResponse::new(part.into_iter().collect()))
    }
}
