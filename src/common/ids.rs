//! Content fingerprints for datasets and models.

use sha2::{Digest, Sha256};

/// Incremental SHA-256 fingerprint, rendered as lowercase hex.
#[derive(Clone, Debug, Default)]
pub struct Fingerprint(Sha256);

impl Fingerprint {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    /// Feed bytes into the digest.
    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Full 64-character hex digest.
    pub fn finish_hex(self) -> String {
        hex::encode(self.0.finalize())
    }

    /// First 12 hex characters, used in identifiers shown to humans.
    pub fn finish_short(self) -> String {
        let mut full = self.finish_hex();
        full.truncate(12);
        full
    }
}
