//! Two-party message exchange.
//!
//! Bob generates a key pair and distributes his public key over a
//! [`KeyTransport`]. Alice decodes the delivered text once and keeps the
//! typed key. Bob signs the message and Alice encrypts it back to him; Alice
//! then verifies Bob's signature and Bob decrypts her ciphertext.
//!
//! The exchange fails closed: the first error moves it to
//! [`ExchangeState::Aborted`] and every later call is refused.

use crate::error::ExchangeError;
use crate::state::{ExchangeState, Step, Transition};
use crate::transport::KeyTransport;
use keypost_core::config::{ExchangeConfig, DEFAULT_MESSAGE};
use keypost_crypto::{
    decrypt_to_string, encrypt, sign, verify, Ciphertext, KeyCodec, KeyPair, PublicKey,
    SerializedKey, Signature, RECOMMENDED_KEY_BITS,
};
use tracing::{error, info};

/// Parameters of one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub key_bits: usize,
    pub message: String,
    pub recipients: Vec<String>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            key_bits: RECOMMENDED_KEY_BITS,
            message: DEFAULT_MESSAGE.to_string(),
            recipients: Vec::new(),
        }
    }
}

impl From<&ExchangeConfig> for ExchangeSettings {
    fn from(config: &ExchangeConfig) -> Self {
        Self {
            key_bits: config.key_bits,
            message: config.message.clone(),
            recipients: config.recipients.clone(),
        }
    }
}

/// Everything a completed exchange produced.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub public_key: String,
    pub fingerprint: String,
    pub key_bits: usize,
    pub message: String,
    pub signature: Signature,
    pub ciphertext: Ciphertext,
    pub recovered: String,
}

/// State machine driving a single exchange.
pub struct MessageExchange<T: KeyTransport> {
    transport: T,
    settings: ExchangeSettings,
    state: ExchangeState,
    history: Vec<Transition>,

    bob: Option<KeyPair>,
    distributed: Option<SerializedKey>,
    // Bob's key as Alice decoded it from the delivered text
    alice_view: Option<PublicKey>,
    signature: Option<Signature>,
    ciphertext: Option<Ciphertext>,
    recovered: Option<String>,
}

impl<T: KeyTransport> MessageExchange<T> {
    pub fn new(transport: T, settings: ExchangeSettings) -> Self {
        Self {
            transport,
            settings,
            state: ExchangeState::Init,
            history: Vec::with_capacity(Step::SEQUENCE.len()),
            bob: None,
            distributed: None,
            alice_view: None,
            signature: None,
            ciphertext: None,
            recovered: None,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    /// Serialized public key, once distributed.
    pub fn public_key_text(&self) -> Option<&str> {
        self.distributed.as_ref().map(SerializedKey::as_str)
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn ciphertext(&self) -> Option<&Ciphertext> {
        self.ciphertext.as_ref()
    }

    pub fn recovered(&self) -> Option<&str> {
        self.recovered.as_deref()
    }

    /// Run every remaining step in order.
    pub fn run(&mut self) -> Result<ExchangeOutcome, ExchangeError> {
        self.generate_keys()?;
        self.distribute_public_key()?;
        self.sign_message()?;
        self.encrypt_message()?;
        self.verify_signature()?;
        self.decrypt_message()?;
        self.finish()
    }

    pub fn generate_keys(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::GenerateKeys, |ex| {
            ex.bob = Some(KeyPair::generate(ex.settings.key_bits)?);
            Ok(())
        })
    }

    /// Serialize Bob's public key, deliver it, and decode it as Alice.
    pub fn distribute_public_key(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::DistributePublicKey, |ex| {
            let bob = ex.require(Step::DistributePublicKey, ex.bob.as_ref())?;
            let serialized = KeyCodec::encode_public(bob.public_key())?;

            ex.transport
                .send(&ex.settings.recipients, serialized.as_bytes())?;
            info!(
                recipients = ex.settings.recipients.len(),
                fingerprint = %bob.public_key().fingerprint(),
                "Distributed public key"
            );

            ex.alice_view = Some(KeyCodec::decode_public(serialized.as_str())?);
            ex.distributed = Some(serialized);
            Ok(())
        })
    }

    pub fn sign_message(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::SignMessage, |ex| {
            let bob = ex.require(Step::SignMessage, ex.bob.as_ref())?;
            ex.signature = Some(sign(bob.private_key(), ex.settings.message.as_bytes())?);
            Ok(())
        })
    }

    pub fn encrypt_message(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::EncryptMessage, |ex| {
            let bob_public = ex.require(Step::EncryptMessage, ex.alice_view.as_ref())?;
            ex.ciphertext = Some(encrypt(bob_public, ex.settings.message.as_bytes())?);
            Ok(())
        })
    }

    pub fn verify_signature(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::VerifySignature, |ex| {
            let bob_public = ex.require(Step::VerifySignature, ex.alice_view.as_ref())?;
            let signature = ex.require(Step::VerifySignature, ex.signature.as_ref())?;
            verify(bob_public, ex.settings.message.as_bytes(), signature)?;
            Ok(())
        })
    }

    pub fn decrypt_message(&mut self) -> Result<(), ExchangeError> {
        self.advance(Step::DecryptMessage, |ex| {
            let bob = ex.require(Step::DecryptMessage, ex.bob.as_ref())?;
            let ciphertext = ex.require(Step::DecryptMessage, ex.ciphertext.as_ref())?;
            ex.recovered = Some(decrypt_to_string(bob.private_key(), ciphertext)?);
            Ok(())
        })
    }

    pub fn finish(&mut self) -> Result<ExchangeOutcome, ExchangeError> {
        self.advance(Step::Finish, |ex| {
            let step = Step::Finish;
            let bob = ex.require(step, ex.bob.as_ref())?;
            Ok(ExchangeOutcome {
                public_key: ex.require(step, ex.distributed.as_ref())?.as_str().to_string(),
                fingerprint: bob.public_key().fingerprint(),
                key_bits: bob.bits(),
                message: ex.settings.message.clone(),
                signature: ex.require(step, ex.signature.as_ref())?.clone(),
                ciphertext: ex.require(step, ex.ciphertext.as_ref())?.clone(),
                recovered: ex.require(step, ex.recovered.clone())?,
            })
        })
    }

    /// Check the precondition of `step`, run it, and record the outcome.
    fn advance<R>(
        &mut self,
        step: Step,
        op: impl FnOnce(&mut Self) -> Result<R, ExchangeError>,
    ) -> Result<R, ExchangeError> {
        if let ExchangeState::Aborted { at } = self.state {
            return Err(ExchangeError::Aborted { at });
        }
        if self.state != step.requires() {
            return Err(ExchangeError::InvalidTransition {
                step,
                expected: step.requires(),
                actual: self.state,
            });
        }

        match op(self) {
            Ok(value) => {
                self.transition(step, step.produces());
                Ok(value)
            }
            Err(e) => {
                error!(step = %step, error = %e, "Exchange aborted");
                self.transition(step, ExchangeState::Aborted { at: step });
                Err(e)
            }
        }
    }

    fn transition(&mut self, step: Step, to: ExchangeState) {
        let from = self.state;
        self.state = to;
        self.history.push(Transition { step, from, to });
        info!(step = %step, from = %from, to = %to, "Exchange transition");
    }

    /// Artifact left by an earlier step; absent only if the state was bypassed.
    fn require<V>(&self, step: Step, value: Option<V>) -> Result<V, ExchangeError> {
        value.ok_or(ExchangeError::InvalidTransition {
            step,
            expected: step.requires(),
            actual: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::LoopbackTransport;
    use keypost_crypto::{GenerationError, VerificationError};

    struct RefusingTransport;

    impl KeyTransport for RefusingTransport {
        fn send(&self, _recipients: &[String], _payload: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::Rejected {
                status: 401,
                body: "invalid api key".to_string(),
            })
        }
    }

    fn settings() -> ExchangeSettings {
        ExchangeSettings {
            key_bits: 1024,
            message: "hello world".to_string(),
            recipients: vec!["alice@example.com".to_string()],
        }
    }

    #[test]
    fn test_run_completes_exchange() {
        let transport = LoopbackTransport::new();
        let mut exchange = MessageExchange::new(&transport, settings());
        let outcome = exchange.run().unwrap();

        assert_eq!(exchange.state(), ExchangeState::Done);
        assert_eq!(outcome.recovered, "hello world");
        assert_eq!(outcome.key_bits, 1024);
        assert_eq!(outcome.signature.len(), 128);
        assert_eq!(outcome.ciphertext.len(), 128);

        let delivered = transport.last_delivery().unwrap();
        assert_eq!(delivered.payload_text(), Some(outcome.public_key.as_str()));

        let visited: Vec<ExchangeState> = exchange.history().iter().map(|t| t.to).collect();
        let expected: Vec<ExchangeState> = Step::SEQUENCE.iter().map(Step::produces).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_out_of_order_step_rejected_without_state_change() {
        let mut exchange = MessageExchange::new(LoopbackTransport::new(), settings());
        let result = exchange.sign_message();

        assert!(matches!(
            result,
            Err(ExchangeError::InvalidTransition {
                step: Step::SignMessage,
                expected: ExchangeState::PublicKeyDistributed,
                actual: ExchangeState::Init,
            })
        ));
        assert_eq!(exchange.state(), ExchangeState::Init);
        assert!(exchange.history().is_empty());
    }

    #[test]
    fn test_generation_failure_aborts() {
        let mut exchange = MessageExchange::new(
            LoopbackTransport::new(),
            ExchangeSettings {
                key_bits: 768,
                ..settings()
            },
        );

        let result = exchange.run();
        assert!(matches!(
            result,
            Err(ExchangeError::Generation(GenerationError::UnsupportedKeySize { bits: 768, .. }))
        ));
        assert_eq!(
            exchange.state(),
            ExchangeState::Aborted { at: Step::GenerateKeys }
        );
        assert!(matches!(
            exchange.generate_keys(),
            Err(ExchangeError::Aborted { at: Step::GenerateKeys })
        ));
    }

    #[test]
    fn test_transport_failure_stops_before_signing() {
        let mut exchange = MessageExchange::new(RefusingTransport, settings());
        let result = exchange.run();

        assert!(matches!(
            result,
            Err(ExchangeError::Transport(TransportError::Rejected { status: 401, .. }))
        ));
        assert_eq!(
            exchange.state(),
            ExchangeState::Aborted { at: Step::DistributePublicKey }
        );
        assert!(exchange.signature().is_none());
        assert!(matches!(
            exchange.sign_message(),
            Err(ExchangeError::Aborted { at: Step::DistributePublicKey })
        ));
    }

    #[test]
    fn test_no_recipients_aborts_distribution() {
        let mut exchange = MessageExchange::new(
            LoopbackTransport::new(),
            ExchangeSettings {
                recipients: Vec::new(),
                ..settings()
            },
        );
        exchange.generate_keys().unwrap();
        assert!(matches!(
            exchange.distribute_public_key(),
            Err(ExchangeError::Transport(TransportError::NoRecipients))
        ));
    }

    #[test]
    fn test_tampered_signature_aborts_verification() {
        let mut exchange = MessageExchange::new(LoopbackTransport::new(), settings());
        exchange.generate_keys().unwrap();
        exchange.distribute_public_key().unwrap();
        exchange.sign_message().unwrap();
        exchange.encrypt_message().unwrap();

        let mut bytes = exchange.signature().unwrap().as_bytes().to_vec();
        bytes[10] ^= 0xff;
        exchange.signature = Some(Signature::from_bytes(bytes));

        assert!(matches!(
            exchange.verify_signature(),
            Err(ExchangeError::Verification(VerificationError::Invalid))
        ));
        assert!(exchange.recovered().is_none());
        assert!(matches!(
            exchange.decrypt_message(),
            Err(ExchangeError::Aborted { at: Step::VerifySignature })
        ));
    }

    #[test]
    fn test_tampered_ciphertext_aborts_decryption() {
        let mut exchange = MessageExchange::new(LoopbackTransport::new(), settings());
        exchange.generate_keys().unwrap();
        exchange.distribute_public_key().unwrap();
        exchange.sign_message().unwrap();
        exchange.encrypt_message().unwrap();
        exchange.verify_signature().unwrap();

        let mut bytes = exchange.ciphertext().unwrap().as_bytes().to_vec();
        bytes[0] ^= 0x01;
        exchange.ciphertext = Some(Ciphertext::from_bytes(bytes));

        assert!(matches!(
            exchange.decrypt_message(),
            Err(ExchangeError::Decryption(_))
        ));
        assert_eq!(
            exchange.state(),
            ExchangeState::Aborted { at: Step::DecryptMessage }
        );
    }

    #[test]
    fn test_oversized_message_aborts_encryption() {
        let mut exchange = MessageExchange::new(
            LoopbackTransport::new(),
            ExchangeSettings {
                message: "x".repeat(63),
                ..settings()
            },
        );
        let result = exchange.run();
        assert!(matches!(result, Err(ExchangeError::Encryption(_))));
        assert_eq!(
            exchange.state(),
            ExchangeState::Aborted { at: Step::EncryptMessage }
        );
        assert!(exchange.signature().is_some());
    }

    #[test]
    fn test_settings_from_config() {
        let config = ExchangeConfig::default();
        let settings = ExchangeSettings::from(&config);
        assert_eq!(settings.key_bits, 2048);
        assert_eq!(settings.message, DEFAULT_MESSAGE);
    }
}
