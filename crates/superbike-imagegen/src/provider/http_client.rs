use std::time::Duration;

use reqwest::{Client, header};

use crate::error::{ImageGenError, Result};

/// Shared HTTP client for all providers of one registry
///
/// `attempt_timeout` bounds every call end to end, including body download.
pub(crate) fn http_client(attempt_timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::CONNECTION, header::HeaderValue::from_static("keep-alive"));

    Client::builder()
        .timeout(attempt_timeout)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
        .build()
        .map_err(|e| ImageGenError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Read an error body for a non-success response
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_else(|_| "Unknown error".to_string())
}

/// Join a path onto a base URL without doubling slashes
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
