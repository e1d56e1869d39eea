//! Timed trial loop shared by every runner
//!
//! Each trial returns an explicit `Result`; the run's [`ErrorPolicy`] decides
//! whether a failure is skipped or ends the run.
//!
//! [`ErrorPolicy`]: crate::config::ErrorPolicy

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::bench::stats::SampleSet;
use crate::config::{Disposition, TrialSettings};
use crate::error::{BenchError, Result};
use crate::events::{BenchEvent, EventSink};

/// Run one call, bounded by `timeout` when set, and time it.
pub async fn timed<T, Fut>(timeout: Option<Duration>, call: Fut) -> (Result<T>, Duration)
where
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(BenchError::Timeout(limit)),
        },
        None => call.await,
    };
    (outcome, start.elapsed())
}

/// Run `settings.iterations` timed trials of `call` for the named path.
///
/// Successful trials are recorded as samples. A failed trial is reported to
/// `sink` and then skipped or returned as the run's error, per the policy.
pub async fn run_trials<T, F, Fut>(
    path: &str,
    settings: &TrialSettings,
    sink: &dyn EventSink,
    mut call: F,
) -> Result<SampleSet>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total = settings.iterations;
    let mut samples = SampleSet::new();

    for iteration in 0..total {
        sink.emit(BenchEvent::TrialStarted {
            path: path.to_string(),
            iteration,
            total,
        });

        let (outcome, elapsed) = timed(settings.timeout, call(iteration)).await;
        match outcome {
            Ok(value) => {
                std::hint::black_box(value);
                samples.record(iteration, elapsed);
                tracing::debug!(path, iteration, elapsed_secs = elapsed.as_secs_f64(), "Trial succeeded");
                sink.emit(BenchEvent::TrialSucceeded {
                    path: path.to_string(),
                    iteration,
                    elapsed,
                });
            }
            Err(error) => {
                samples.record_failure();
                let kind = error.kind();
                tracing::warn!(path, iteration, %kind, error = %error, "Trial failed");
                sink.emit(BenchEvent::TrialFailed {
                    path: path.to_string(),
                    iteration,
                    kind,
                    message: error.to_string(),
                });
                if settings.policy.disposition(kind) == Disposition::Abort {
                    return Err(error);
                }
            }
        }
    }

    Ok(samples)
}
