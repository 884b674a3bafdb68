//! Timing suites over the full exchange pipeline.
//!
//! [`single_pass`] times each step once, the way a first look at the
//! algorithm would. [`repeated`] runs every operation through
//! [`measure`](crate::harness::measure) and is fail-fast per operation.

use crate::error::{BenchmarkError, SuiteError};
use crate::harness::{measure, Measurement};
use keypost_crypto::{
    decrypt_to_string, encrypt, sign, verify, Ciphertext, CryptoError, KeyCodec, KeyPair, PublicKey,
    Signature,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

/// Alice's reply, encrypted under Bob's public key.
pub const ALICE_MESSAGE: &str = "Mensagem confidencial de Alice para Bob.";

/// Elapsed time of one named pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub step: &'static str,
    pub elapsed: Duration,
}

/// Result of [`single_pass`].
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub key_bits: usize,
    pub steps: Vec<StepTiming>,
    pub recovered: String,
}

impl SuiteReport {
    /// (step index, elapsed ms), 1-based.
    pub fn series_ms(&self) -> Vec<(f64, f64)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, s)| ((i + 1) as f64, s.elapsed.as_secs_f64() * 1000.0))
            .collect()
    }

    pub fn total(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }
}

/// Result of [`repeated`].
#[derive(Debug, Clone, Serialize)]
pub struct RepeatedReport {
    pub key_bits: usize,
    pub iterations: usize,
    pub measurements: Vec<Measurement>,
}

impl RepeatedReport {
    /// Every per-call sample in run order as (call index, elapsed ms), 1-based.
    pub fn timeline_ms(&self) -> Vec<(f64, f64)> {
        self.measurements
            .iter()
            .flat_map(|m| m.samples.iter())
            .enumerate()
            .map(|(i, s)| ((i + 1) as f64, s.elapsed.as_secs_f64() * 1000.0))
            .collect()
    }

    pub fn get(&self, operation: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.operation == operation)
    }
}

fn crypto<E: Into<CryptoError>>(e: E) -> SuiteError {
    SuiteError::Crypto(e.into())
}

fn timed<T, E>(op: impl FnOnce() -> Result<T, E>) -> Result<(T, Duration), E> {
    let start = Instant::now();
    let value = op()?;
    Ok((value, start.elapsed()))
}

/// Time one pass of the pipeline: Bob's key generation and export, signing,
/// verification, Alice's encryption and Bob's decryption.
pub fn single_pass(bits: usize, message: &str) -> Result<SuiteReport, SuiteError> {
    let mut steps = Vec::with_capacity(5);

    let ((bob, exported), elapsed) = timed(|| -> Result<_, SuiteError> {
        let pair = KeyPair::generate(bits).map_err(crypto)?;
        let exported = KeyCodec::encode_public(pair.public_key()).map_err(crypto)?;
        Ok((pair, exported))
    })?;
    steps.push(StepTiming { step: "key generation", elapsed });

    // Alice's view of Bob, parsed once
    let bob_public = KeyCodec::decode_public(exported.as_str()).map_err(crypto)?;

    let (signature, elapsed) = timed(|| sign(bob.private_key(), message.as_bytes())).map_err(crypto)?;
    steps.push(StepTiming { step: "sign", elapsed });

    let ((), elapsed) =
        timed(|| verify(&bob_public, message.as_bytes(), &signature)).map_err(crypto)?;
    steps.push(StepTiming { step: "verify", elapsed });

    let (ciphertext, elapsed) =
        timed(|| encrypt(&bob_public, ALICE_MESSAGE.as_bytes())).map_err(crypto)?;
    steps.push(StepTiming { step: "encrypt", elapsed });

    let (recovered, elapsed) =
        timed(|| decrypt_to_string(bob.private_key(), &ciphertext)).map_err(crypto)?;
    steps.push(StepTiming { step: "decrypt", elapsed });

    for step in &steps {
        info!(step = step.step, elapsed_ms = step.elapsed.as_millis() as u64, "Single pass step");
    }

    Ok(SuiteReport {
        key_bits: bits,
        steps,
        recovered,
    })
}

/// Measure every pipeline operation `iterations` times.
///
/// Keys, signatures and ciphertexts produced by the last iteration of one
/// operation feed the next.
pub fn repeated(bits: usize, iterations: usize, message: &str) -> Result<RepeatedReport, SuiteError> {
    let missing = |operation: &str| {
        SuiteError::Benchmark(BenchmarkError::NoIterations {
            operation: operation.to_string(),
        })
    };
    let mut measurements = Vec::with_capacity(6);

    let mut bob: Option<KeyPair> = None;
    measurements.push(measure("bob key generation", iterations, || {
        bob = Some(KeyPair::generate(bits)?);
        Ok::<(), keypost_crypto::GenerationError>(())
    })?);
    let bob = bob.ok_or_else(|| missing("bob key generation"))?;

    let exported = KeyCodec::encode_public(bob.public_key()).map_err(crypto)?;
    let bob_public: PublicKey = KeyCodec::decode_public(exported.as_str()).map_err(crypto)?;

    measurements.push(measure("alice key generation", iterations, || {
        KeyPair::generate(bits).map(drop)
    })?);

    let mut signature: Option<Signature> = None;
    measurements.push(measure("sign", iterations, || {
        signature = Some(sign(bob.private_key(), message.as_bytes())?);
        Ok::<(), keypost_crypto::SigningError>(())
    })?);
    let signature = signature.ok_or_else(|| missing("sign"))?;

    measurements.push(measure("verify", iterations, || {
        verify(&bob_public, message.as_bytes(), &signature)
    })?);

    let mut ciphertext: Option<Ciphertext> = None;
    measurements.push(measure("encrypt", iterations, || {
        ciphertext = Some(encrypt(&bob_public, message.as_bytes())?);
        Ok::<(), keypost_crypto::EncryptionError>(())
    })?);
    let ciphertext = ciphertext.ok_or_else(|| missing("encrypt"))?;

    measurements.push(measure("decrypt", iterations, || {
        decrypt_to_string(bob.private_key(), &ciphertext).map(drop)
    })?);

    Ok(RepeatedReport {
        key_bits: bits,
        iterations,
        measurements,
    })
}
