//! Test utilities for cross-crate scenarios

use keypost_crypto::KeyPair;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Modulus size used by the scenarios.
pub const SCENARIO_BITS: usize = 2048;

/// Initialize tracing only if not already initialized
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Bob's key pair, generated once per test binary.
pub fn bob() -> &'static KeyPair {
    static BOB: OnceLock<KeyPair> = OnceLock::new();
    BOB.get_or_init(|| KeyPair::generate(SCENARIO_BITS).expect("generate Bob's key pair"))
}

/// An unrelated key pair, generated once per test binary.
pub fn stranger() -> &'static KeyPair {
    static STRANGER: OnceLock<KeyPair> = OnceLock::new();
    STRANGER.get_or_init(|| KeyPair::generate(SCENARIO_BITS).expect("generate stranger key pair"))
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "keypost-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
