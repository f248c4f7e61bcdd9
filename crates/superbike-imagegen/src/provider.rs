pub(crate) mod gemini;
pub(crate) mod http_client;
pub(crate) mod openai;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{GenerationRequest, GenerationResponse, RetryPolicy, SourceImage},
};

/// One configured image-generation backend
///
/// `generate` performs exactly one image call. Anything a backend needs
/// before that call, such as a subject caption, comes from `describe`, which
/// runs once per request and is never retried.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Configured provider name
    fn name(&self) -> &str;

    /// Prompt sent with every image call
    fn prompt(&self) -> &str;

    /// How image-less responses are handled
    fn retry_policy(&self) -> RetryPolicy;

    /// Describe the subject of `source` ahead of generation
    async fn describe(&self, _source: &SourceImage) -> Result<Option<String>> {
        Ok(None)
    }

    /// Run a single image-generation call
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}
