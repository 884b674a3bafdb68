//! End-to-end exchange scenarios
//!
//! Alice only ever holds Bob's key as the text that crossed the transport.

use crate::test_utils::{bob, init_tracing, stranger, SCENARIO_BITS};
use keypost_core::config::{Config, DEFAULT_MESSAGE};
use keypost_crypto::{
    decrypt, decrypt_to_string, encrypt, sign, verify, DecryptionError, KeyCodec, VerificationError,
};
use keypost_exchange::{
    ExchangeError, ExchangeSettings, ExchangeState, KeyTransport, LoopbackTransport,
    MessageExchange, Step, TransportError,
};

#[test]
fn test_hello_world_signature_through_delivered_key() {
    init_tracing();

    let transport = LoopbackTransport::new();
    let block = KeyCodec::encode_public(bob().public_key()).unwrap();
    transport
        .send(&["alice@example.com".to_string()], block.as_bytes())
        .unwrap();

    let delivered = transport.last_delivery().unwrap();
    let bob_public = KeyCodec::decode_public(delivered.payload_text().unwrap()).unwrap();

    let signature = sign(bob().private_key(), b"hello world").unwrap();
    assert!(verify(&bob_public, b"hello world", &signature).is_ok());
    assert!(matches!(
        verify(&bob_public, b"hello worlds", &signature),
        Err(VerificationError::Invalid)
    ));
}

#[test]
fn test_secret_message_recovered_only_by_bob() {
    init_tracing();

    let ciphertext = encrypt(bob().public_key(), DEFAULT_MESSAGE.as_bytes()).unwrap();
    assert_eq!(ciphertext.len(), SCENARIO_BITS / 8);

    let recovered = decrypt_to_string(bob().private_key(), &ciphertext).unwrap();
    assert_eq!(recovered, DEFAULT_MESSAGE);

    assert!(matches!(
        decrypt(stranger().private_key(), &ciphertext),
        Err(DecryptionError::Rejected)
    ));
}

#[test]
fn test_private_block_round_trip_keeps_capability() {
    let block = KeyCodec::encode_private(bob().private_key()).unwrap();
    let restored = KeyCodec::decode_private(block.as_str()).unwrap();

    let signature = sign(&restored, b"restored").unwrap();
    assert!(verify(bob().public_key(), b"restored", &signature).is_ok());
}

#[test]
fn test_configured_exchange_runs_to_done() {
    init_tracing();

    let mut config = Config::default_config();
    config.apply_env_with(|key| match key {
        "KEYPOST_RECIPIENTS" => Some("alice@example.com, carol@example.com".to_string()),
        _ => None,
    });
    config.validate().unwrap();

    let transport = LoopbackTransport::new();
    let mut exchange = MessageExchange::new(&transport, ExchangeSettings::from(&config.exchange));
    let outcome = exchange.run().unwrap();

    assert_eq!(exchange.state(), ExchangeState::Done);
    assert_eq!(outcome.key_bits, SCENARIO_BITS);
    assert_eq!(outcome.recovered, DEFAULT_MESSAGE);

    let delivery = transport.last_delivery().unwrap();
    assert_eq!(delivery.recipients.len(), 2);

    // What Alice received decodes to the key the outcome reports
    let received = KeyCodec::decode_public(delivery.payload_text().unwrap()).unwrap();
    assert_eq!(received.fingerprint(), outcome.fingerprint);
    assert!(verify(&received, DEFAULT_MESSAGE.as_bytes(), &outcome.signature).is_ok());
}

struct CorruptingTransport {
    inner: LoopbackTransport,
}

impl KeyTransport for CorruptingTransport {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        let text = String::from_utf8_lossy(payload).replace("BEGIN", "BEGlN");
        self.inner.send(recipients, text.as_bytes())
    }
}

#[test]
fn test_exchange_stops_at_first_failure() {
    let mut exchange = MessageExchange::new(
        LoopbackTransport::new(),
        ExchangeSettings {
            key_bits: 512,
            recipients: vec!["alice@example.com".to_string()],
            ..ExchangeSettings::default()
        },
    );

    assert!(matches!(exchange.run(), Err(ExchangeError::Generation(_))));
    assert_eq!(exchange.history().len(), 1);
    assert!(exchange.public_key_text().is_none());
    assert!(exchange.transport().deliveries().is_empty());
    assert!(matches!(
        exchange.finish(),
        Err(ExchangeError::Aborted { at: Step::GenerateKeys })
    ));
}

#[test]
fn test_mangled_key_block_rejected_by_alice() {
    // A key block mangled in transit never reaches Alice as a key
    let transport = CorruptingTransport {
        inner: LoopbackTransport::new(),
    };
    let block = KeyCodec::encode_public(bob().public_key()).unwrap();
    transport
        .send(&["alice@example.com".to_string()], block.as_bytes())
        .unwrap();

    let delivered = transport.inner.last_delivery().unwrap();
    assert!(KeyCodec::decode_public(delivered.payload_text().unwrap()).is_err());
}
