//! Exchange states and the steps that move between them.
//!
//! # State Transitions
//!
//! ```text
//! Init
//!     ↓ (generate_keys)
//! KeysGenerated
//!     ↓ (distribute_public_key)
//! PublicKeyDistributed
//!     ↓ (sign_message)
//! MessageSigned
//!     ↓ (encrypt_message)
//! MessageEncrypted
//!     ↓ (verify_signature)
//! Verified
//!     ↓ (decrypt_message)
//! Decrypted
//!     ↓ (finish)
//! Done
//! ```
//!
//! A failing step moves the exchange to `Aborted { at }`, which is terminal.

use serde::Serialize;
use std::fmt;

/// Current position of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExchangeState {
    Init,
    KeysGenerated,
    PublicKeyDistributed,
    MessageSigned,
    MessageEncrypted,
    Verified,
    Decrypted,
    Done,
    /// A step failed; no further transitions are possible.
    Aborted { at: Step },
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted { .. })
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::KeysGenerated => write!(f, "KEYS_GENERATED"),
            Self::PublicKeyDistributed => write!(f, "PUBLIC_KEY_DISTRIBUTED"),
            Self::MessageSigned => write!(f, "MESSAGE_SIGNED"),
            Self::MessageEncrypted => write!(f, "MESSAGE_ENCRYPTED"),
            Self::Verified => write!(f, "VERIFIED"),
            Self::Decrypted => write!(f, "DECRYPTED"),
            Self::Done => write!(f, "DONE"),
            Self::Aborted { at } => write!(f, "ABORTED({at})"),
        }
    }
}

/// One transition of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    GenerateKeys,
    DistributePublicKey,
    SignMessage,
    EncryptMessage,
    VerifySignature,
    DecryptMessage,
    Finish,
}

impl Step {
    /// Every step in execution order.
    pub const SEQUENCE: [Step; 7] = [
        Step::GenerateKeys,
        Step::DistributePublicKey,
        Step::SignMessage,
        Step::EncryptMessage,
        Step::VerifySignature,
        Step::DecryptMessage,
        Step::Finish,
    ];

    /// State the exchange must be in before this step runs.
    pub fn requires(&self) -> ExchangeState {
        match self {
            Self::GenerateKeys => ExchangeState::Init,
            Self::DistributePublicKey => ExchangeState::KeysGenerated,
            Self::SignMessage => ExchangeState::PublicKeyDistributed,
            Self::EncryptMessage => ExchangeState::MessageSigned,
            Self::VerifySignature => ExchangeState::MessageEncrypted,
            Self::DecryptMessage => ExchangeState::Verified,
            Self::Finish => ExchangeState::Decrypted,
        }
    }

    /// State the exchange is in after this step succeeds.
    pub fn produces(&self) -> ExchangeState {
        match self {
            Self::GenerateKeys => ExchangeState::KeysGenerated,
            Self::DistributePublicKey => ExchangeState::PublicKeyDistributed,
            Self::SignMessage => ExchangeState::MessageSigned,
            Self::EncryptMessage => ExchangeState::MessageEncrypted,
            Self::VerifySignature => ExchangeState::Verified,
            Self::DecryptMessage => ExchangeState::Decrypted,
            Self::Finish => ExchangeState::Done,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GenerateKeys => "generate keys",
            Self::DistributePublicKey => "distribute public key",
            Self::SignMessage => "sign message",
            Self::EncryptMessage => "encrypt message",
            Self::VerifySignature => "verify signature",
            Self::DecryptMessage => "decrypt message",
            Self::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Record of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub step: Step,
    pub from: ExchangeState,
    pub to: ExchangeState,
}
