//! HTTP surface for avatar generation

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod avatar;
mod error;
mod health;
mod pipeline;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use superbike_config::Config;
use tower_http::trace::TraceLayer;

pub use avatar::{ATTEMPTS_HEADER, AvatarUpload, PROVIDER_HEADER};
pub use error::{AvatarError, Result};
pub use pipeline::{Avatar, AvatarPipeline};

/// Route for avatar uploads
pub const AVATAR_PATH: &str = "/v1/avatars";

/// Shared handler state
#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: AvatarPipeline,
    download_filename: Arc<str>,
}

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Providers, the logo, and the banner font are all resolved here, so a
    /// broken configuration fails at startup rather than on the first upload.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let pipeline = AvatarPipeline::from_config(config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Build the server around an already-assembled pipeline
    pub fn with_pipeline(config: &Config, pipeline: AvatarPipeline) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        tracing::debug!(?pipeline, font = pipeline.compositor().font_name(), "avatar pipeline ready");

        let state = AppState {
            pipeline,
            download_filename: Arc::from(config.branding.download_filename.as_str()),
        };

        let mut app = Router::new().route(
            AVATAR_PATH,
            post(avatar::create_avatar)
                .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
                .with_state(state),
        );

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, get(health::health_handler));
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
