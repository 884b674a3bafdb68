//! Core functionality shared across the keypost workspace.
//!
//! This crate provides configuration loading, logging bootstrap and the
//! core error type used by the library crates and the `keypost` binary.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BenchConfig, Config, ExchangeConfig, TransportConfig};
pub use error::{CoreError, Result};
