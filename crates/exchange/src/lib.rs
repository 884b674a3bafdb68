//! Bob/Alice message exchange over RSA keys.
//!
//! The [`MessageExchange`] state machine sequences key generation, public key
//! distribution, signing, encryption, verification and decryption. Public
//! keys leave the process through a [`KeyTransport`].

pub mod error;
pub mod orchestrator;
pub mod state;
pub mod transport;

pub use error::{ExchangeError, TransportError};
pub use orchestrator::{ExchangeOutcome, ExchangeSettings, MessageExchange};
pub use state::{ExchangeState, Step, Transition};
pub use transport::{Delivery, KeyTransport, LoopbackTransport, ResendTransport, ATTACHMENT_NAME};
