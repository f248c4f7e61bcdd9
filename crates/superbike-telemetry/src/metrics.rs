//! Metric names and the instruments recorded by the avatar pipeline

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};

/// Provider calls made, labelled by provider and outcome
pub const GENERATION_ATTEMPT_COUNT: &str = "generation.attempt.count";
/// Wall time of a whole generation request, retries included
pub const GENERATION_REQUEST_DURATION: &str = "generation.request.duration";
/// Wall time spent pasting the logo and banner
pub const COMPOSITE_DURATION: &str = "composite.duration";

/// Instruments for the generate-then-composite pipeline
#[derive(Clone)]
pub struct PipelineMetrics {
    attempts: Counter<u64>,
    request_duration: Histogram<f64>,
    composite_duration: Histogram<f64>,
}

impl PipelineMetrics {
    /// Create instruments on the global meter provider
    ///
    /// Without an installed provider the instruments are no-ops.
    pub fn new() -> Self {
        let meter = global::meter("superbike");

        Self {
            attempts: meter
                .u64_counter(GENERATION_ATTEMPT_COUNT)
                .with_description("Generation provider calls")
                .build(),
            request_duration: meter
                .f64_histogram(GENERATION_REQUEST_DURATION)
                .with_unit("s")
                .with_description("Generation request duration including retries")
                .build(),
            composite_duration: meter
                .f64_histogram(COMPOSITE_DURATION)
                .with_unit("s")
                .with_description("Logo and banner compositing duration")
                .build(),
        }
    }

    /// Count one provider call
    pub fn record_attempt(&self, provider: &str, outcome: &'static str) {
        self.attempts.add(
            1,
            &[
                KeyValue::new("provider", provider.to_owned()),
                KeyValue::new("outcome", outcome),
            ],
        );
    }

    /// Record a finished generation request
    pub fn record_request(&self, provider: &str, result: &'static str, start: Instant) {
        self.request_duration.record(
            start.elapsed().as_secs_f64(),
            &[
                KeyValue::new("provider", provider.to_owned()),
                KeyValue::new("result", result),
            ],
        );
    }

    /// Record one compositing pass
    pub fn record_composite(&self, start: Instant) {
        self.composite_duration.record(start.elapsed().as_secs_f64(), &[]);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
