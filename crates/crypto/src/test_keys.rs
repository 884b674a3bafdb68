//! Shared key pairs for unit tests.
//!
//! RSA generation dominates test time, so tests that do not exercise
//! generation itself borrow these lazily generated pairs.

use crate::keys::KeyPair;
use std::sync::OnceLock;

static BOB_1024: OnceLock<KeyPair> = OnceLock::new();
static ALICE_1024: OnceLock<KeyPair> = OnceLock::new();
static BOB_2048: OnceLock<KeyPair> = OnceLock::new();

pub fn bob_1024() -> &'static KeyPair {
    BOB_1024.get_or_init(|| KeyPair::generate(1024).unwrap())
}

pub fn alice_1024() -> &'static KeyPair {
    ALICE_1024.get_or_init(|| KeyPair::generate(1024).unwrap())
}

pub fn bob_2048() -> &'static KeyPair {
    BOB_2048.get_or_init(|| KeyPair::generate(2048).unwrap())
}
