//! Cryptographic operations for the keypost message exchange.
//!
//! This crate composes the RustCrypto `rsa` implementation into the four
//! operations the exchange needs. It never implements RSA arithmetic itself.
//!
//! # Core Capabilities
//!
//! - **Key Generation**: RSA key pairs of 1024/2048/3072/4096 bits
//! - **Key Serialization**: PKCS#1 DER wrapped in `-----BEGIN RSA ... KEY-----` blocks
//! - **Digital Signatures**: RSASSA-PSS over SHA-256
//! - **Encryption**: RSAES-OAEP with SHA-256
//!
//! # Security Principles
//!
//! - Keys are parsed once at the boundary and passed as typed values
//! - Signature validity is decided by verification, never by byte comparison
//! - Decryption failures are opaque
//! - Private key material is zeroized on drop and redacted from `Debug`

pub mod cipher;
pub mod codec;
pub mod error;
pub mod keys;
pub mod signing;

#[cfg(test)]
mod test_keys;

pub use cipher::{decrypt, decrypt_to_string, encrypt, max_plaintext_len, Ciphertext};
pub use codec::{KeyCodec, KeyKind, SerializedKey};
pub use error::{
    CryptoError, CryptoResult, DecryptionError, EncryptionError, FormatError, GenerationError,
    SigningError, VerificationError,
};
pub use keys::{
    EntropySource, KeyPair, KeyPairGenerator, PrivateKey, PublicKey, MIN_KEY_BITS,
    RECOMMENDED_KEY_BITS, SUPPORTED_KEY_BITS,
};
pub use signing::{digest, sign, verify, Signature, DIGEST_LEN};
