//! Error types for the message exchange and its transport.

use crate::state::{ExchangeState, Step};
use keypost_crypto::{
    DecryptionError, EncryptionError, FormatError, GenerationError, SigningError,
    VerificationError,
};
use thiserror::Error;

/// Errors from delivering a serialized key to its recipients.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No recipients configured")]
    NoRecipients,

    #[error("Transport request failed: {0}")]
    Http(String),

    #[error("Transport rejected delivery with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors that stop a message exchange.
///
/// Failures from a step carry the originating typed error; the exchange is
/// left in [`ExchangeState::Aborted`] afterwards.
#[derive(Debug, Error)]
pub enum ExchangeError {
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

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Cannot {step} in state {actual} (requires {expected})")]
    InvalidTransition {
        step: Step,
        expected: ExchangeState,
        actual: ExchangeState,
    },

    #[error("Exchange was aborted at step '{at}'")]
    Aborted { at: Step },
}
