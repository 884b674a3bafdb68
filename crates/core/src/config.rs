//! Configuration management for keypost.
//!
//! Configuration comes from three layers, applied in order: built-in
//! defaults, an optional TOML file, and the process environment.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the transport API key.
pub const API_KEY_ENV: &str = "API_KEY_RESEND";

/// Environment variable holding comma-separated key recipients.
pub const RECIPIENTS_ENV: &str = "KEYPOST_RECIPIENTS";

/// Message exchanged when the caller supplies none.
pub const DEFAULT_MESSAGE: &str = "Esta é uma mensagem secreta de Bob para Alice.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub bench: BenchConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub key_bits: usize,
    pub message: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub enabled: bool,
    pub iterations: usize,
    pub output_dir: PathBuf,
    pub single_pass_chart: String,
    pub repeated_chart: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Never written back out; only read from file or environment.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub sender: String,
    pub subject: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            key_bits: 2048,
            message: DEFAULT_MESSAGE.to_string(),
            recipients: Vec::new(),
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 10,
            output_dir: PathBuf::from("."),
            single_pass_chart: "grafico-execucao-algoritmo.svg".to_string(),
            repeated_chart: "grafico-execucao-algoritmo-10-vezes.svg".to_string(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.resend.com/emails".to_string(),
            sender: "Chatbot <onboarding@resend.dev>".to_string(),
            subject: "Sua chave pública chegou!".to_string(),
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("sender", &self.sender)
            .field("subject", &self.subject)
            .finish()
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup, so tests need not touch the
    /// real process environment.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.transport.api_key = Some(key.trim().to_string());
        }

        if let Some(raw) = lookup(RECIPIENTS_ENV) {
            let recipients: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
            if !recipients.is_empty() {
                self.exchange.recipients = recipients;
            }
        }
    }

    /// Rejects settings that cannot drive a run.
    ///
    /// Key sizes are checked by the key generator itself, which reports
    /// the typed generation error.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.key_bits == 0 {
            return Err(CoreError::Config("exchange.key_bits must be positive".into()));
        }

        if self.bench.iterations == 0 {
            return Err(CoreError::Config("bench.iterations must be positive".into()));
        }

        if self.transport.endpoint.trim().is_empty() {
            return Err(CoreError::Config("transport.endpoint must not be empty".into()));
        }

        Ok(())
    }

    /// True when an outbound transport can actually be used.
    pub fn transport_enabled(&self) -> bool {
        self.transport.api_key.is_some() && !self.exchange.recipients.is_empty()
    }
}
