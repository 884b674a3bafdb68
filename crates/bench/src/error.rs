//! Error types for benchmark runs and chart rendering.

use thiserror::Error;

/// Boxed error returned by a benchmarked operation.
pub type OperationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Benchmark '{operation}' requested zero iterations")]
    NoIterations { operation: String },

    /// The first failing iteration aborts the run; no samples are kept.
    #[error("Operation '{operation}' failed on iteration {iteration}: {source}")]
    OperationFailed {
        operation: String,
        iteration: usize,
        #[source]
        source: OperationError,
    },
}

/// Errors from a benchmark suite run.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),

    /// A pipeline step outside any measured loop failed.
    #[error(transparent)]
    Crypto(#[from] keypost_crypto::CryptoError),
}

/// Errors from the visualization collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render: series is empty")]
    EmptySeries,

    #[error("Series contains a non-finite point at index {index}")]
    NonFinitePoint { index: usize },

    #[error("Failed to serialize series: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
