//! Public-key encryption with RSAES-OAEP (SHA-256, empty label).
//!
//! Encryption is randomized: the same plaintext under the same key yields a
//! different ciphertext on every call. Payload size is bounded by
//! [`max_plaintext_len`] and checked before the primitive runs.
//!
//! Decryption uses RSA blinding and reports every padding failure as the
//! same opaque [`DecryptionError::Rejected`].

use crate::error::{DecryptionError, EncryptionError};
use crate::keys::{EntropySource, PrivateKey, PublicKey};
use crate::signing::DIGEST_LEN;
use rand::{CryptoRng, RngCore};
use rsa::Oaep;
use sha2::Sha256;
use tracing::debug;

/// RSA-OAEP ciphertext bytes; length equals the recipient's modulus size.
#[derive(Clone, Debug)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

fn padding() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Largest plaintext `key` can carry: `modulus_bytes - 2 * digest_len - 2`.
pub fn max_plaintext_len(key: &PublicKey) -> usize {
    key.modulus_bytes().saturating_sub(2 * DIGEST_LEN + 2)
}

/// Encrypt `message` for the holder of `key`.
pub fn encrypt(key: &PublicKey, message: &[u8]) -> Result<Ciphertext, EncryptionError> {
    let mut rng =
        EntropySource::new().map_err(|e| EncryptionError::EntropyUnavailable(e.to_string()))?;
    encrypt_with_rng(&mut rng, key, message)
}

/// Encrypt `message` with a caller-supplied CSPRNG.
pub fn encrypt_with_rng<R>(rng: &mut R, key: &PublicKey, message: &[u8]) -> Result<Ciphertext, EncryptionError>
where
    R: CryptoRng + RngCore,
{
    let max = max_plaintext_len(key);
    if message.len() > max {
        return Err(EncryptionError::PlaintextTooLong {
            len: message.len(),
            max,
        });
    }

    let ciphertext = key
        .as_rsa()
        .encrypt(rng, padding(), message)
        .map_err(|e| EncryptionError::Primitive(e.to_string()))?;

    debug!(
        plaintext_len = message.len(),
        ciphertext_len = ciphertext.len(),
        "Encrypted message"
    );
    Ok(Ciphertext(ciphertext))
}

/// Recover the plaintext sealed under the public half of `key`.
pub fn decrypt(key: &PrivateKey, ciphertext: &Ciphertext) -> Result<Vec<u8>, DecryptionError> {
    let expected = key.modulus_bytes();
    if ciphertext.len() != expected {
        return Err(DecryptionError::Length {
            expected,
            actual: ciphertext.len(),
        });
    }

    let mut rng =
        EntropySource::new().map_err(|e| DecryptionError::EntropyUnavailable(e.to_string()))?;

    key.as_rsa()
        .decrypt_blinded(&mut rng, padding(), ciphertext.as_bytes())
        .map_err(|_| DecryptionError::Rejected)
}

/// [`decrypt`] for payloads known to be UTF-8 text.
pub fn decrypt_to_string(key: &PrivateKey, ciphertext: &Ciphertext) -> Result<String, DecryptionError> {
    let plaintext = decrypt(key, ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| DecryptionError::Utf8)
}
