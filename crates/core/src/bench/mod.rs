//! Benchmark runners
//!
//! - `trial`: the timed loop and per-failure policy handling
//! - `stats`: samples and summaries
//! - `latency`: direct vs agent round trips
//! - `cpu`: baseline vs candidate text processor

pub mod cpu;
pub mod latency;
pub mod stats;
pub mod trial;

pub use cpu::{Comparison, CpuBenchmark};
pub use latency::{LatencyBenchmark, AGENT_PATH, DIRECT_PATH};
pub use stats::{BenchmarkSummary, Sample, SampleSet};
pub use trial::{run_trials, timed};
