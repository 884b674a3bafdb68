//! RSA key pair generation and strongly typed key halves.
//!
//! Keys are parsed once at the boundary (see [`crate::codec`]) and passed
//! around as [`PublicKey`] / [`PrivateKey`] values from then on.
//!
//! # Security
//!
//! - Only the sizes in [`SUPPORTED_KEY_BITS`] are accepted
//! - Randomness comes from the OS CSPRNG, probed before each generation so
//!   an unavailable source is reported instead of panicking
//! - Private key material is zeroized on drop and never printed by `Debug`

use crate::error::GenerationError;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::{debug, info};

/// Modulus sizes accepted by the generator, smallest first.
pub const SUPPORTED_KEY_BITS: [usize; 4] = [MIN_KEY_BITS, RECOMMENDED_KEY_BITS, 3072, 4096];

/// Smallest supported modulus size.
pub const MIN_KEY_BITS: usize = 1024;

/// Size used when the caller has no preference.
pub const RECOMMENDED_KEY_BITS: usize = 2048;

/// Cryptographically secure entropy source backed by the operating system.
pub struct EntropySource {
    rng: OsRng,
}

impl EntropySource {
    /// Create a new entropy source, failing if the OS RNG cannot deliver bytes.
    pub fn new() -> Result<Self, rand::Error> {
        let mut rng = OsRng;
        probe(&mut rng)?;
        Ok(Self { rng })
    }
}

impl RngCore for EntropySource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

impl CryptoRng for EntropySource {}

fn probe<R: RngCore>(rng: &mut R) -> Result<(), rand::Error> {
    let mut probe = [0u8; 32];
    rng.try_fill_bytes(&mut probe)
}

/// Public half of an RSA key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    pub(crate) fn from_rsa(inner: RsaPublicKey) -> Self {
        Self { inner }
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    /// Modulus size in bytes. Signatures and ciphertexts have exactly this length.
    pub fn modulus_bytes(&self) -> usize {
        self.inner.size()
    }

    /// Stable identifier: first 16 bytes of BLAKE3(modulus || exponent), hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.inner.n().to_bytes_be());
        hasher.update(&self.inner.e().to_bytes_be());
        let hash = hasher.finalize();
        hex::encode(&hash.as_bytes()[..16])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Private half of an RSA key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    pub(crate) fn from_rsa(inner: RsaPrivateKey) -> Self {
        Self { inner }
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_rsa(self.inner.to_public_key())
    }

    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    pub fn modulus_bytes(&self) -> usize {
        self.inner.size()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .field("material", &"<redacted>")
            .finish()
    }
}

/// A mathematically linked public/private key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS entropy source.
    pub fn generate(bits: usize) -> Result<Self, GenerationError> {
        KeyPairGenerator::new()?.generate(bits)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn bits(&self) -> usize {
        self.public.bits()
    }

    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}

/// Produces independent RSA key pairs.
pub struct KeyPairGenerator {
    entropy: EntropySource,
}

impl KeyPairGenerator {
    /// Create a generator backed by the OS entropy source.
    pub fn new() -> Result<Self, GenerationError> {
        let entropy =
            EntropySource::new().map_err(|e| GenerationError::EntropyUnavailable(e.to_string()))?;
        Ok(Self { entropy })
    }

    /// Generate a key pair with a modulus of exactly `bits` bits.
    pub fn generate(&mut self, bits: usize) -> Result<KeyPair, GenerationError> {
        generate_with_rng(&mut self.entropy, bits)
    }
}

/// Generate a key pair from a caller-supplied CSPRNG.
pub fn generate_with_rng<R>(rng: &mut R, bits: usize) -> Result<KeyPair, GenerationError>
where
    R: CryptoRng + RngCore,
{
    if bits < MIN_KEY_BITS || !SUPPORTED_KEY_BITS.contains(&bits) {
        return Err(GenerationError::UnsupportedKeySize {
            bits,
            supported: &SUPPORTED_KEY_BITS,
        });
    }

    probe(rng).map_err(|e| GenerationError::EntropyUnavailable(e.to_string()))?;

    debug!(bits, "Generating RSA key pair");
    let inner =
        RsaPrivateKey::new(rng, bits).map_err(|e| GenerationError::Primitive(e.to_string()))?;

    let private = PrivateKey::from_rsa(inner);
    let public = private.public_key();
    info!(bits, fingerprint = %public.fingerprint(), "Generated RSA key pair");

    Ok(KeyPair { private, public })
}
