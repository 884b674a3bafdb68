//! Sequential wall-clock benchmark harness.
//!
//! [`measure`] runs an operation a fixed number of times on the calling
//! thread and returns every per-call sample along with the truncated mean
//! in whole milliseconds. The sample buffer belongs to the call; nothing is
//! shared between runs.
//!
//! The baseline contract is fail-fast: the first failing iteration aborts
//! the run and discards the samples collected so far. [`measure_isolated`]
//! is the opt-in variant that keeps going and counts failures instead.

use crate::error::{BenchmarkError, OperationError};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on samples reserved up front; larger runs grow as they go.
const MAX_RESERVED_SAMPLES: usize = 1024;

/// Elapsed time of one call. `iteration` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkSample {
    pub iteration: usize,
    pub elapsed: Duration,
}

/// Result of a completed benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub operation: String,
    pub iterations: usize,
    pub total: Duration,
    /// Mean per call, truncated to whole milliseconds.
    pub average: Duration,
    pub samples: Vec<BenchmarkSample>,
}

impl Measurement {
    fn from_samples(operation: &str, samples: Vec<BenchmarkSample>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let iterations = samples.len();
        let total: Duration = samples.iter().map(|s| s.elapsed).sum();
        let average_ms = total.as_millis() / iterations as u128;
        let average = Duration::from_millis(u64::try_from(average_ms).unwrap_or(u64::MAX));

        Some(Self {
            operation: operation.to_string(),
            iterations,
            total,
            average,
            samples,
        })
    }

    pub fn average_ms(&self) -> u128 {
        self.average.as_millis()
    }

    /// Sample at the given percentile (0-100) of the sorted per-call times;
    /// `None` when there are no samples.
    pub fn percentile(&self, pct: usize) -> Option<Duration> {
        let mut durations: Vec<Duration> = self.samples.iter().map(|s| s.elapsed).collect();
        durations.sort();
        let last = durations.len().checked_sub(1)?;
        let index = ((durations.len() * pct.min(100)) / 100).min(last);
        durations.get(index).copied()
    }

    pub fn median(&self) -> Option<Duration> {
        self.percentile(50)
    }

    /// (iteration, elapsed ms) per call.
    pub fn series_ms(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.iteration as f64, s.elapsed.as_secs_f64() * 1000.0))
            .collect()
    }

    /// (iteration, running total ms) per call.
    pub fn cumulative_ms(&self) -> Vec<(f64, f64)> {
        let mut running = Duration::ZERO;
        self.samples
            .iter()
            .map(|s| {
                running += s.elapsed;
                (s.iteration as f64, running.as_secs_f64() * 1000.0)
            })
            .collect()
    }
}

/// Run `op` `iterations` times and aggregate its wall-clock cost.
///
/// The first error aborts the run with [`BenchmarkError::OperationFailed`];
/// no partial statistic is reported.
pub fn measure<F, E>(operation: &str, iterations: usize, mut op: F) -> Result<Measurement, BenchmarkError>
where
    F: FnMut() -> Result<(), E>,
    E: Into<OperationError>,
{
    if iterations == 0 {
        return Err(BenchmarkError::NoIterations {
            operation: operation.to_string(),
        });
    }

    let mut samples = Vec::with_capacity(iterations.min(MAX_RESERVED_SAMPLES));

    for iteration in 1..=iterations {
        let start = Instant::now();
        let outcome = op();
        let elapsed = start.elapsed();

        if let Err(e) = outcome {
            warn!(operation, iteration, "Benchmark aborted on failed iteration");
            return Err(BenchmarkError::OperationFailed {
                operation: operation.to_string(),
                iteration,
                source: e.into(),
            });
        }

        debug!(operation, iteration, elapsed_us = elapsed.as_micros() as u64, "Iteration complete");
        samples.push(BenchmarkSample { iteration, elapsed });
    }

    let measurement = Measurement::from_samples(operation, samples).ok_or_else(|| {
        BenchmarkError::NoIterations {
            operation: operation.to_string(),
        }
    })?;

    info!(
        operation,
        iterations,
        average_ms = measurement.average_ms() as u64,
        "Average time"
    );
    Ok(measurement)
}

/// A failed iteration recorded by [`measure_isolated`].
#[derive(Debug, Clone, Serialize)]
pub struct IterationFailure {
    pub iteration: usize,
    pub error: String,
}

/// Outcome of a run that tolerates failing iterations.
#[derive(Debug, Clone, Serialize)]
pub struct IsolatedMeasurement {
    pub operation: String,
    pub attempted: usize,
    /// Statistics over successful iterations; `None` when all failed.
    pub measurement: Option<Measurement>,
    pub failures: Vec<IterationFailure>,
}

impl IsolatedMeasurement {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn success_count(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// Like [`measure`], but a failing iteration is recorded and skipped.
pub fn measure_isolated<F, E>(
    operation: &str,
    iterations: usize,
    mut op: F,
) -> Result<IsolatedMeasurement, BenchmarkError>
where
    F: FnMut() -> Result<(), E>,
    E: Into<OperationError>,
{
    if iterations == 0 {
        return Err(BenchmarkError::NoIterations {
            operation: operation.to_string(),
        });
    }

    let mut samples = Vec::with_capacity(iterations.min(MAX_RESERVED_SAMPLES));
    let mut failures = Vec::new();

    for iteration in 1..=iterations {
        let start = Instant::now();
        let outcome = op();
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => samples.push(BenchmarkSample { iteration, elapsed }),
            Err(e) => {
                let error: OperationError = e.into();
                warn!(operation, iteration, error = %error, "Iteration failed; continuing");
                failures.push(IterationFailure {
                    iteration,
                    error: error.to_string(),
                });
            }
        }
    }

    let measurement = Measurement::from_samples(operation, samples);
    info!(
        operation,
        attempted = iterations,
        failures = failures.len(),
        average_ms = measurement.as_ref().map(|m| m.average_ms() as u64),
        "Average time (isolated)"
    );

    Ok(IsolatedMeasurement {
        operation: operation.to_string(),
        attempted: iterations,
        measurement,
        failures,
    })
}
