// Run events
//
// Runners report progress through an EventSink instead of printing. The CLI
// renders events on the console; tests collect them in memory.

use std::time::Duration;

use crate::bench::stats::BenchmarkSummary;
use crate::error::FailureKind;
use crate::verify::VerifyStage;

/// Events emitted during a run
#[derive(Debug, Clone, PartialEq)]
pub enum BenchEvent {
    /// A timed loop is starting
    RunStarted { path: String, iterations: usize },
    /// A trial is about to be timed
    TrialStarted {
        path: String,
        iteration: usize,
        total: usize,
    },
    /// A trial succeeded and its sample was recorded
    TrialSucceeded {
        path: String,
        iteration: usize,
        elapsed: Duration,
    },
    /// A trial failed; whether the run continues depends on the policy
    TrialFailed {
        path: String,
        iteration: usize,
        kind: FailureKind,
        message: String,
    },
    /// A timed loop finished
    RunCompleted(BenchmarkSummary),
    /// A verification stage passed
    StagePassed { stage: VerifyStage, detail: String },
}

/// Trait for receiving run events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BenchEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: BenchEvent) {}
}
