//! Error types for keypost cryptographic operations.
//!
//! Each operation family reports its own error type so callers can tell a
//! malformed key block from a forged signature without string matching.
//! [`CryptoError`] gathers them for code that drives several operations.

use thiserror::Error;

/// Errors that can occur while generating a key pair.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unsupported key size: {bits} bits (supported: {supported:?})")]
    UnsupportedKeySize {
        bits: usize,
        supported: &'static [usize],
    },

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Key generation failed: {0}")]
    Primitive(String),
}

/// Errors that can occur while encoding or decoding a serialized key block.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Missing '-----BEGIN {expected}-----' header")]
    MissingHeader { expected: &'static str },

    #[error("Missing '-----END {expected}-----' footer")]
    MissingFooter { expected: &'static str },

    #[error("Unexpected key label: expected '{expected}', found '{found}'")]
    UnexpectedLabel {
        expected: &'static str,
        found: String,
    },

    #[error("Invalid base64 body: {0}")]
    InvalidBase64(String),

    #[error("Invalid key encoding: {0}")]
    InvalidKey(String),

    #[error("Key encoding failed: {0}")]
    Encoding(String),
}

/// Errors that can occur during signing.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Key too small for signature padding: {modulus_bytes} bytes (need at least {required})")]
    KeyTooSmall {
        modulus_bytes: usize,
        required: usize,
    },

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Signing failed: {0}")]
    Primitive(String),
}

/// Errors that can occur during signature verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Signature length mismatch: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Signature is not valid for this message and key")]
    Invalid,
}

/// Errors that can occur during encryption.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Plaintext too long: {len} bytes (maximum {max} for this key)")]
    PlaintextTooLong { len: usize, max: usize },

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Encryption failed: {0}")]
    Primitive(String),
}

/// Errors that can occur during decryption.
///
/// `Rejected` carries no detail about which check failed.
#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("Ciphertext length mismatch: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Decryption failed")]
    Rejected,

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Decrypted payload is not valid UTF-8")]
    Utf8,
}

/// Umbrella error for callers that sequence several operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Decryption(#[from] DecryptionError),
}

/// Result type for cryptographic operations that may fail in several ways.
pub type CryptoResult<T> = Result<T, CryptoError>;
