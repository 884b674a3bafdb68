//! Message signing and verification with RSASSA-PSS over SHA-256.
//!
//! # Security Model
//!
//! - Every message is hashed with SHA-256 before padding
//! - PSS salt is fresh for each signature, so two signatures of the same
//!   message differ byte-for-byte; validity is only ever decided by [`verify`]
//! - [`verify`] succeeds only for the exact message digest signed by the
//!   private half of the supplied public key

use crate::error::{SigningError, VerificationError};
use crate::keys::{EntropySource, PrivateKey, PublicKey};
use rand::{CryptoRng, RngCore};
use rsa::Pss;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// SHA-256 output length in bytes.
pub const DIGEST_LEN: usize = 32;

/// PSS needs room for the digest, a digest-sized salt and two marker bytes.
const MIN_PSS_MODULUS_BYTES: usize = 2 * DIGEST_LEN + 2;

/// RSA-PSS signature bytes; length equals the signer's modulus size.
#[derive(Clone, Debug)]
pub struct Signature(Vec<u8>);

impl Signature {
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

/// Compute the fixed-size digest that is actually signed.
pub fn digest(message: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(message).into()
}

fn padding() -> Pss {
    Pss::new::<Sha256>()
}

/// Sign `message` with the OS entropy source supplying the PSS salt.
pub fn sign(key: &PrivateKey, message: &[u8]) -> Result<Signature, SigningError> {
    let mut rng =
        EntropySource::new().map_err(|e| SigningError::EntropyUnavailable(e.to_string()))?;
    sign_with_rng(&mut rng, key, message)
}

/// Sign `message` with a caller-supplied CSPRNG.
pub fn sign_with_rng<R>(rng: &mut R, key: &PrivateKey, message: &[u8]) -> Result<Signature, SigningError>
where
    R: CryptoRng + RngCore,
{
    let modulus_bytes = key.modulus_bytes();
    if modulus_bytes < MIN_PSS_MODULUS_BYTES {
        return Err(SigningError::KeyTooSmall {
            modulus_bytes,
            required: MIN_PSS_MODULUS_BYTES,
        });
    }

    let hashed = digest(message);
    let signature = key
        .as_rsa()
        .sign_with_rng(rng, padding(), &hashed)
        .map_err(|e| SigningError::Primitive(e.to_string()))?;

    debug!(
        message_len = message.len(),
        signature_len = signature.len(),
        "Signed message"
    );
    Ok(Signature(signature))
}

/// Verify that `signature` was produced over `message` by the private half of `key`.
pub fn verify(key: &PublicKey, message: &[u8], signature: &Signature) -> Result<(), VerificationError> {
    let expected = key.modulus_bytes();
    if signature.len() != expected {
        warn!(expected, actual = signature.len(), "Signature length mismatch");
        return Err(VerificationError::Length {
            expected,
            actual: signature.len(),
        });
    }

    let hashed = digest(message);
    key.as_rsa()
        .verify(padding(), &hashed, signature.as_bytes())
        .map_err(|_| {
            warn!(fingerprint = %key.fingerprint(), "Signature verification failed");
            VerificationError::Invalid
        })
}
