//! Mock generation backend for integration tests
//!
//! Serves the Gemini `generateContent` endpoint and the OpenAI captioning,
//! image edit, and file download endpoints from a single listener.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use base64::{Engine, engine::general_purpose::STANDARD};
use tokio_util::sync::CancellationToken;

/// Caption returned by the mock captioning endpoint
pub const MOCK_CAPTION: &str = "A smiling kid with curly black hair and a green hoodie";

/// How image calls are answered
#[derive(Debug, Clone, Copy)]
pub enum ImageReply {
    /// Image on every call
    Image,
    /// `n` image-less answers, then images
    EmptyThenImage(u32),
    /// Prompt blocked on every call
    Blocked,
    /// Text without an image on every call
    TextOnly,
}

/// Builder for [`MockProvider`]
pub struct MockProviderBuilder {
    reply: ImageReply,
    fail_status: Option<u16>,
    caption_fail_status: Option<u16>,
    edit_via_url: bool,
    delay: Option<Duration>,
    image: Vec<u8>,
}

impl MockProviderBuilder {
    pub fn reply(mut self, reply: ImageReply) -> Self {
        self.reply = reply;
        self
    }

    /// Answer every image call with this HTTP status
    pub fn failing(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Answer captioning calls with this HTTP status
    pub fn caption_failing(mut self, status: u16) -> Self {
        self.caption_fail_status = Some(status);
        self
    }

    /// Return OpenAI edit results as a URL instead of inline base64
    pub fn edit_via_url(mut self) -> Self {
        self.edit_via_url = true;
        self
    }

    /// Sleep before answering image calls
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Generated image size
    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.image = super::png(width, height, [30, 160, 60]);
        self
    }

    pub async fn start(self) -> anyhow::Result<MockProvider> {
        let (empty_before_image, always_empty) = match self.reply {
            ImageReply::Image => (0, false),
            ImageReply::EmptyThenImage(n) => (n, false),
            ImageReply::Blocked | ImageReply::TextOnly => (0, true),
        };

        let state = Arc::new(MockState {
            reply: self.reply,
            empty_before_image: AtomicU32::new(empty_before_image),
            always_empty,
            fail_status: self.fail_status,
            caption_fail_status: self.caption_fail_status,
            edit_via_url: self.edit_via_url,
            delay: self.delay,
            image: self.image,
            addr: OnceLock::new(),
            gemini_count: AtomicU32::new(0),
            caption_count: AtomicU32::new(0),
            edit_count: AtomicU32::new(0),
            download_count: AtomicU32::new(0),
            last_api_key: Mutex::new(None),
            last_prompt: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1beta/models/{model_action}", routing::post(handle_generate_content))
            .route("/v1/chat/completions", routing::post(handle_caption))
            .route("/v1/images/edits", routing::post(handle_edit))
            .route("/files/avatar.png", routing::get(handle_download))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let _ = state.addr.set(addr);

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockProvider { addr, shutdown, state })
    }
}

/// Mock backend with per-endpoint call counters
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: ImageReply,
    empty_before_image: AtomicU32,
    always_empty: bool,
    fail_status: Option<u16>,
    caption_fail_status: Option<u16>,
    edit_via_url: bool,
    delay: Option<Duration>,
    image: Vec<u8>,
    addr: OnceLock<SocketAddr>,
    gemini_count: AtomicU32,
    caption_count: AtomicU32,
    edit_count: AtomicU32,
    download_count: AtomicU32,
    last_api_key: Mutex<Option<String>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockState {
    /// Whether this image call should come back without an image
    fn answer_empty(&self) -> bool {
        if self.always_empty {
            return true;
        }

        self.empty_before_image
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure(&self, status: Option<u16>) -> Option<Response> {
        let status = StatusCode::from_u16(status?).expect("valid status");
        Some(
            (
                status,
                Json(serde_json::json!({ "error": { "message": "Mock provider error", "code": status.as_u16() } })),
            )
                .into_response(),
        )
    }
}

impl MockProvider {
    pub fn builder() -> MockProviderBuilder {
        MockProviderBuilder {
            reply: ImageReply::Image,
            fail_status: None,
            caption_fail_status: None,
            edit_via_url: false,
            delay: None,
            image: super::png(320, 240, [30, 160, 60]),
        }
    }

    /// Start a mock that returns an image on every call
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// Base URL for a Gemini provider
    pub fn gemini_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Base URL for an OpenAI provider
    pub fn openai_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn gemini_count(&self) -> u32 {
        self.state.gemini_count.load(Ordering::Relaxed)
    }

    pub fn caption_count(&self) -> u32 {
        self.state.caption_count.load(Ordering::Relaxed)
    }

    pub fn edit_count(&self) -> u32 {
        self.state.edit_count.load(Ordering::Relaxed)
    }

    pub fn download_count(&self) -> u32 {
        self.state.download_count.load(Ordering::Relaxed)
    }

    /// API key seen on the most recent authenticated call
    pub fn last_api_key(&self) -> Option<String> {
        self.state.last_api_key.lock().expect("lock").clone()
    }

    /// Prompt seen on the most recent image call
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().expect("lock").clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate_content(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.gemini_count.fetch_add(1, Ordering::Relaxed);
    *state.last_api_key.lock().expect("lock") = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    *state.last_prompt.lock().expect("lock") = body["contents"][0]["parts"][0]["text"].as_str().map(ToOwned::to_owned);

    state.pause().await;

    if let Some(failure) = state.failure(state.fail_status) {
        return failure;
    }

    if body["contents"][0]["parts"][1]["inlineData"]["data"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "missing inline image").into_response();
    }

    if state.answer_empty() {
        let reply = match state.reply {
            ImageReply::Blocked => serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
            _ => serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "I can't generate that image." }] },
                    "finishReason": "STOP"
                }]
            }),
        };
        return Json(reply).into_response();
    }

    Json(serde_json::json!({
        "candidates": [{
            "content": { "parts": [
                { "text": "Here is your superbike rider." },
                { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(&state.image) } }
            ]},
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

async fn handle_caption(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.caption_count.fetch_add(1, Ordering::Relaxed);
    *state.last_api_key.lock().expect("lock") = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    if let Some(failure) = state.failure(state.caption_fail_status) {
        return failure;
    }

    let has_image = body["messages"][0]["content"][1]["image_url"]["url"]
        .as_str()
        .is_some_and(|url| url.starts_with("data:image/"));
    if !has_image {
        return (StatusCode::BAD_REQUEST, "missing image_url").into_response();
    }

    Json(serde_json::json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": MOCK_CAPTION } }]
    }))
    .into_response()
}

async fn handle_edit(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    state.edit_count.fetch_add(1, Ordering::Relaxed);

    let mut has_image = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "image" => has_image = field.bytes().await.is_ok_and(|b| !b.is_empty()),
            "prompt" => {
                let prompt = field.text().await.ok();
                *state.last_prompt.lock().expect("lock") = prompt;
            }
            _ => {}
        }
    }

    if !has_image {
        return (StatusCode::BAD_REQUEST, "missing image").into_response();
    }

    state.pause().await;

    if let Some(failure) = state.failure(state.fail_status) {
        return failure;
    }

    if state.answer_empty() {
        return Json(serde_json::json!({ "created": 1, "data": [] })).into_response();
    }

    let item = if state.edit_via_url {
        serde_json::json!({ "url": format!("http://{}/files/avatar.png", state.addr.get().expect("address set")) })
    } else {
        serde_json::json!({ "b64_json": STANDARD.encode(&state.image) })
    };

    Json(serde_json::json!({ "created": 1, "data": [item] })).into_response()
}

async fn handle_download(State(state): State<Arc<MockState>>) -> Response {
    state.download_count.fetch_add(1, Ordering::Relaxed);
    ([("content-type", "image/png")], state.image.clone()).into_response()
}
