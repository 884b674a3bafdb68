//! Cross-crate scenarios for keypost
//!
//! This test suite validates:
//! - The full Bob/Alice exchange at 2048 bits through a delivered key block
//! - Fail-closed behavior when any step of the exchange fails
//! - Benchmark suites feeding chart output without affecting results

pub mod test_utils;

#[cfg(test)]
mod exchange_scenario_tests;

#[cfg(test)]
mod benchmark_pipeline_tests;
