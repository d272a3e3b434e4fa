//! Content fingerprints for cache busting.
//!
//! A fingerprint is a pure function of the artifact bytes: the blake3 digest,
//! hex encoded and truncated to the configured length.

use std::fmt;

/// Truncated hex digest of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex characters in a full blake3 digest.
    pub const FULL_LENGTH: usize = 64;

    /// Fingerprint `bytes`, keeping the first `length` hex characters.
    pub fn compute(bytes: &[u8], length: usize) -> Self {
        let digest = blake3::hash(bytes);
        let mut hex = hex::encode(digest.as_bytes());
        hex.truncate(length.clamp(1, Self::FULL_LENGTH));
        Self(hex)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_fingerprint() {
        let a = Fingerprint::compute(b".x{color:red}", 8);
        let b = Fingerprint::compute(b".x{color:red}", 8);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 8);
    }

    #[test]
    fn test_single_byte_changes_fingerprint() {
        let a = Fingerprint::compute(b".x{color:red}", 16);
        let b = Fingerprint::compute(b".x{color:rea}", 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_digest_prefix() {
        // blake3("") = af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262
        assert_eq!(Fingerprint::compute(b"", 12).as_str(), "af1349b9f5f9");
    }

    #[test]
    fn test_length_is_clamped() {
        assert_eq!(Fingerprint::compute(b"abc", 500).as_str().len(), 64);
    }
}
