//! Timing harness and suites for the keypost exchange pipeline.
//!
//! - [`harness`]: sequential, fail-fast wall-clock measurement
//! - [`suite`]: single-pass and repeated runs over keys, signing and encryption
//! - [`render`]: SVG and JSON output for the collected series

pub mod error;
pub mod harness;
pub mod render;
pub mod suite;

pub use error::{BenchmarkError, OperationError, RenderError, SuiteError};
pub use harness::{
    measure, measure_isolated, BenchmarkSample, IsolatedMeasurement, IterationFailure, Measurement,
};
pub use render::{renderer_for, JsonSeries, SampleRenderer, SvgLineChart, DEFAULT_TITLE};
pub use suite::{repeated, single_pass, RepeatedReport, StepTiming, SuiteReport, ALICE_MESSAGE};
