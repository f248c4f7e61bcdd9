//! Image generation against hosted providers, with retry on image-less responses

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod orchestrator;
mod provider;
mod registry;
mod types;

pub use error::{ImageGenError, Result};
pub use orchestrator::{AttemptObserver, run_attempts};
pub use provider::GenerationClient;
pub use registry::{Generation, ProviderRegistry, ProviderRegistryBuilder};
pub use types::{
    AttemptOutcome, GenerationAttempt, GenerationOutcome, GenerationPart, GenerationRequest, GenerationResponse,
    RetryPolicy, SourceImage,
};
