//! CPU microbenchmark: baseline vs candidate text processor

use serde::Serialize;

use crate::bench::stats::BenchmarkSummary;
use crate::bench::trial::run_trials;
use crate::config::TrialSettings;
use crate::error::Result;
use crate::events::{BenchEvent, EventSink};
use crate::processor::TextProcessor;

/// Outcome of running one workload on both processors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Workload label, e.g. "fibonacci(30)"
    pub workload: String,
    pub baseline: BenchmarkSummary,
    pub candidate: BenchmarkSummary,
    /// Baseline output for the workload input
    pub baseline_output: u64,
    /// Candidate output for the workload input
    pub candidate_output: u64,
    pub outputs_agree: bool,
    /// Baseline mean / candidate mean; absent when either mean is zero
    pub speedup: Option<f64>,
    /// Caveat on reading `speedup`, e.g. when the processors use different algorithms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runs identical workloads on two processors with the same iteration count
pub struct CpuBenchmark<'a> {
    baseline: &'a dyn TextProcessor,
    candidate: &'a dyn TextProcessor,
    trials: TrialSettings,
    sink: &'a dyn EventSink,
}

impl<'a> CpuBenchmark<'a> {
    pub fn new(
        baseline: &'a dyn TextProcessor,
        candidate: &'a dyn TextProcessor,
        trials: TrialSettings,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            baseline,
            candidate,
            trials,
            sink,
        }
    }

    /// Time `fibonacci(n)` on both processors
    pub async fn fibonacci_comparison(&self, n: u32) -> Result<Comparison> {
        let workload = format!("fibonacci({n})");
        let baseline_output = self.baseline.fibonacci(n)?;
        let candidate_output = self.candidate.fibonacci(n)?;

        let baseline = self
            .measure(&workload, self.baseline, |p| p.fibonacci(n))
            .await?;
        let candidate = self
            .measure(&workload, self.candidate, |p| p.fibonacci(n))
            .await?;

        let (baseline_algorithm, candidate_algorithm) = (
            self.baseline.fibonacci_algorithm(),
            self.candidate.fibonacci_algorithm(),
        );
        let note = (baseline_algorithm != candidate_algorithm).then(|| {
            format!(
                "{} is {baseline_algorithm} and {} is {candidate_algorithm}, so the speedup includes the algorithm change",
                self.baseline.name(),
                self.candidate.name()
            )
        });

        let mut comparison =
            self.compare(workload, baseline, candidate, baseline_output, candidate_output);
        comparison.note = note;
        Ok(comparison)
    }

    /// Time `token_count(text)` on both processors
    pub async fn token_count_comparison(&self, text: &str) -> Result<Comparison> {
        let workload = format!("token_count({} bytes)", text.len());
        let baseline_output = self.baseline.token_count(text)? as u64;
        let candidate_output = self.candidate.token_count(text)? as u64;

        let baseline = self
            .measure(&workload, self.baseline, |p| p.token_count(text))
            .await?;
        let candidate = self
            .measure(&workload, self.candidate, |p| p.token_count(text))
            .await?;

        Ok(self.compare(workload, baseline, candidate, baseline_output, candidate_output))
    }

    async fn measure<T>(
        &self,
        workload: &str,
        processor: &dyn TextProcessor,
        op: impl Fn(&dyn TextProcessor) -> Result<T>,
    ) -> Result<BenchmarkSummary> {
        let path = format!("{} {}", processor.name(), workload);
        self.sink.emit(BenchEvent::RunStarted {
            path: path.clone(),
            iterations: self.trials.iterations,
        });

        let op = &op;
        let samples = run_trials(&path, &self.trials, self.sink, |_| async move {
            op(processor)
        })
        .await?;

        let summary = samples.summarize(path, self.trials.iterations);
        self.sink.emit(BenchEvent::RunCompleted(summary.clone()));
        Ok(summary)
    }

    fn compare(
        &self,
        workload: String,
        baseline: BenchmarkSummary,
        candidate: BenchmarkSummary,
        baseline_output: u64,
        candidate_output: u64,
    ) -> Comparison {
        let outputs_agree = baseline_output == candidate_output;
        if !outputs_agree {
            tracing::warn!(
                %workload,
                baseline = self.baseline.name(),
                candidate = self.candidate.name(),
                baseline_output,
                candidate_output,
                "Processors disagree on workload output"
            );
        }

        let speedup = (baseline.mean_secs > 0.0 && candidate.mean_secs > 0.0)
            .then(|| baseline.mean_secs / candidate.mean_secs);

        tracing::info!(
            %workload,
            baseline_mean_secs = baseline.mean_secs,
            candidate_mean_secs = candidate.mean_secs,
            speedup = ?speedup,
            "CPU comparison completed"
        );

        Comparison {
            workload,
            baseline,
            candidate,
            baseline_output,
            candidate_output,
            outputs_agree,
            speedup,
            note: None,
        }
    }
}
