use crate::{
    error::{ImageGenError, Result},
    provider::GenerationClient,
    types::{AttemptOutcome, GenerationAttempt, GenerationOutcome, GenerationRequest, RetryPolicy},
};

/// Receives progress while attempts run
///
/// Observers see every attempt but cannot change the control flow.
pub trait AttemptObserver: Send {
    /// Called before attempt `ordinal` of `max_attempts`
    fn attempt_started(&mut self, _ordinal: u32, _max_attempts: u32) {}

    /// Called after each attempt with its outcome
    fn attempt_finished(&mut self, _attempt: &GenerationAttempt) {}
}

/// Observer that ignores progress
impl AttemptObserver for () {}

/// Drive `client` under `policy` until an image arrives or the policy gives up
///
/// Attempts are sequential. Transport errors abort immediately and are never
/// retried. Under [`RetryPolicy::UntilImage`] running out of attempts is an
/// [`GenerationOutcome::Exhausted`] value; under
/// [`RetryPolicy::SingleAttempt`] an image-less response is
/// [`ImageGenError::NoImageReturned`].
pub async fn run_attempts(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    policy: RetryPolicy,
    observer: &mut dyn AttemptObserver,
) -> Result<GenerationOutcome> {
    let max_attempts = match policy {
        RetryPolicy::UntilImage { max_attempts } => max_attempts.max(1),
        RetryPolicy::SingleAttempt => 1,
    };

    for ordinal in 1..=max_attempts {
        observer.attempt_started(ordinal, max_attempts);

        tracing::debug!(provider = client.name(), attempt = ordinal, max_attempts, "generation attempt");

        let finished = |outcome| GenerationAttempt {
            ordinal,
            max_attempts,
            outcome,
        };

        let response = match client.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                observer.attempt_finished(&finished(AttemptOutcome::Error));
                tracing::warn!(provider = client.name(), attempt = ordinal, error = %e, "generation attempt failed");
                return Err(e);
            }
        };

        let text = response.text();

        if let Some(image) = response.into_inline_image() {
            observer.attempt_finished(&finished(AttemptOutcome::Image));
            tracing::info!(provider = client.name(), attempt = ordinal, max_attempts, "image generated");
            return Ok(GenerationOutcome::Succeeded {
                image,
                attempts: ordinal,
            });
        }

        observer.attempt_finished(&finished(AttemptOutcome::NoContent));
        tracing::warn!(
            provider = client.name(),
            attempt = ordinal,
            max_attempts,
            text = text.as_deref().unwrap_or(""),
            "response contained no image"
        );

        if policy == RetryPolicy::SingleAttempt {
            let detail = text.unwrap_or_else(|| "response contained no image".to_string());
            return Err(ImageGenError::NoImageReturned(detail));
        }
    }

    tracing::warn!(provider = client.name(), max_attempts, "no image after all attempts");

    Ok(GenerationOutcome::Exhausted {
        attempts: max_attempts,
    })
}
