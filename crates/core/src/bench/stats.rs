//! Samples and summaries

use std::time::Duration;

use serde::Serialize;

/// One measured trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub iteration: usize,
    pub elapsed: Duration,
}

/// Samples recorded by one timed loop. Only successful trials are recorded.
#[derive(Debug, Default, Clone)]
pub struct SampleSet {
    samples: Vec<Sample>,
    failed: usize,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, iteration: usize, elapsed: Duration) {
        self.samples.push(Sample { iteration, elapsed });
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Arithmetic mean in seconds; 0 when nothing succeeded
    pub fn mean_secs(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(|s| s.elapsed.as_secs_f64()).sum();
        total / self.samples.len() as f64
    }

    pub fn min_secs(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.elapsed)
            .min()
            .map(|d| d.as_secs_f64())
    }

    pub fn max_secs(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.elapsed)
            .max()
            .map(|d| d.as_secs_f64())
    }

    /// Reduce to a summary. The samples themselves are not kept.
    pub fn summarize(self, path: impl Into<String>, iterations: usize) -> BenchmarkSummary {
        BenchmarkSummary {
            path: path.into(),
            iterations,
            succeeded: self.len(),
            failed: self.failed,
            mean_secs: self.mean_secs(),
            min_secs: self.min_secs(),
            max_secs: self.max_secs(),
        }
    }
}

/// Result of one timed loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    /// Name of the measured code path
    pub path: String,
    /// Configured iteration count
    pub iterations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub mean_secs: f64,
    pub min_secs: Option<f64>,
    pub max_secs: Option<f64>,
}
