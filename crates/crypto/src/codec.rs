//! Textual key serialization.
//!
//! Keys travel as delimited, base64-wrapped PKCS#1 DER blocks:
//!
//! ```text
//! -----BEGIN RSA PUBLIC KEY-----
//! MIIBCgKCAQEAu1SU1LfVLPHCozMxH2Mo4lgOEePzNm0tRgeLezV6ffAt0gunVTLw
//! ...
//! -----END RSA PUBLIC KEY-----
//! ```
//!
//! Decoding is strict about the label: a private block handed to
//! [`KeyCodec::decode_public`] is rejected rather than silently downgraded.

use crate::error::FormatError;
use crate::keys::{PrivateKey, PublicKey};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Base64 characters per body line.
pub const LINE_WIDTH: usize = 64;

const BEGIN_PREFIX: &str = "-----BEGIN ";
const END_PREFIX: &str = "-----END ";
const MARKER_SUFFIX: &str = "-----";

/// Which half of a key pair a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Public,
    Private,
}

impl KeyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "RSA PUBLIC KEY",
            Self::Private => "RSA PRIVATE KEY",
        }
    }
}

/// A serialized key block. Private blocks are wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SerializedKey {
    #[zeroize(skip)]
    kind: KeyKind,
    text: String,
}

impl SerializedKey {
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

impl std::fmt::Debug for SerializedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            KeyKind::Public => f
                .debug_struct("SerializedKey")
                .field("kind", &self.kind)
                .field("text", &self.text)
                .finish(),
            KeyKind::Private => f
                .debug_struct("SerializedKey")
                .field("kind", &self.kind)
                .field("text", &"<redacted>")
                .finish(),
        }
    }
}

/// Encoder/decoder for serialized key blocks.
pub struct KeyCodec;

impl KeyCodec {
    /// Serialize a public key. Does not fail for keys produced by this crate.
    pub fn encode_public(key: &PublicKey) -> Result<SerializedKey, FormatError> {
        let der = key
            .as_rsa()
            .to_pkcs1_der()
            .map_err(|e| FormatError::Encoding(e.to_string()))?;
        Ok(armor(KeyKind::Public, der.as_bytes()))
    }

    /// Serialize a private key. The result is sensitive; callers decide
    /// where it may go.
    pub fn encode_private(key: &PrivateKey) -> Result<SerializedKey, FormatError> {
        let der = key
            .as_rsa()
            .to_pkcs1_der()
            .map_err(|e| FormatError::Encoding(e.to_string()))?;
        Ok(armor(KeyKind::Private, der.as_bytes()))
    }

    pub fn decode_public(text: &str) -> Result<PublicKey, FormatError> {
        let der = unarmor(KeyKind::Public, text)?;
        let inner = RsaPublicKey::from_pkcs1_der(&der)
            .map_err(|e| FormatError::InvalidKey(e.to_string()))?;
        Ok(PublicKey::from_rsa(inner))
    }

    pub fn decode_private(text: &str) -> Result<PrivateKey, FormatError> {
        let der = unarmor(KeyKind::Private, text)?;
        let inner = RsaPrivateKey::from_pkcs1_der(&der)
            .map_err(|e| FormatError::InvalidKey(e.to_string()))?;
        inner
            .validate()
            .map_err(|e| FormatError::InvalidKey(e.to_string()))?;
        Ok(PrivateKey::from_rsa(inner))
    }
}

fn armor(kind: KeyKind, der: &[u8]) -> SerializedKey {
    let body = Zeroizing::new(BASE64.encode(der));
    let mut text = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);

    text.push_str(BEGIN_PREFIX);
    text.push_str(kind.label());
    text.push_str(MARKER_SUFFIX);
    text.push('\n');

    // base64 output is ASCII, so byte offsets are char boundaries
    let mut rest = body.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(LINE_WIDTH));
        text.push_str(line);
        text.push('\n');
        rest = tail;
    }

    text.push_str(END_PREFIX);
    text.push_str(kind.label());
    text.push_str(MARKER_SUFFIX);
    text.push('\n');

    SerializedKey { kind, text }
}

fn unarmor(kind: KeyKind, text: &str) -> Result<Zeroizing<Vec<u8>>, FormatError> {
    let expected = kind.label();
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let (begin_idx, label) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| {
            line.strip_prefix(BEGIN_PREFIX)
                .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
                .map(|label| (i, label))
        })
        .ok_or(FormatError::MissingHeader { expected })?;

    if label != expected {
        return Err(FormatError::UnexpectedLabel {
            expected,
            found: label.to_string(),
        });
    }

    let end_marker = format!("{END_PREFIX}{expected}{MARKER_SUFFIX}");
    let body_lines = &lines[begin_idx + 1..];
    let end_offset = body_lines
        .iter()
        .position(|line| *line == end_marker)
        .ok_or(FormatError::MissingFooter { expected })?;

    let body: Zeroizing<String> = Zeroizing::new(
        body_lines[..end_offset]
            .iter()
            .flat_map(|line| line.chars())
            .filter(|c| !c.is_whitespace())
            .collect(),
    );

    BASE64
        .decode(body.as_bytes())
        .map(Zeroizing::new)
        .map_err(|e| FormatError::InvalidBase64(e.to_string()))
}
