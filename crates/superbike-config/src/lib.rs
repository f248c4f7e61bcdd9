#![allow(clippy::must_use_candidate)]

pub mod branding;
mod env;
pub mod generation;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use branding::*;
pub use generation::*;
pub use health::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level Superbike configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Generation provider and retry configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Logo and banner overlay configuration
    #[serde(default)]
    pub branding: BrandingConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
