use regex::Regex;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// Digest algorithms used for diagnostics and fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlg {
    /// SHA-1, the digest inside the record-unit signature scheme.
    #[serde(rename = "sha-1")]
    Sha1,
    /// SHA-256, used for key fingerprints.
    #[serde(rename = "sha-256")]
    Sha256,
}

impl DigestAlg {
    /// Stable algorithm label.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlg::Sha1 => "sha-1",
            DigestAlg::Sha256 => "sha-256",
        }
    }

    fn hex_len(&self) -> usize {
        match self {
            DigestAlg::Sha1 => 40,
            DigestAlg::Sha256 => 64,
        }
    }
}

/// Algorithm + digest bytes, encoded as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm.
    pub alg: DigestAlg,
    /// Lowercase hex digest.
    pub hex: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, hex: impl Into<String>) -> Result<Self, ValidationError> {
        let hex = hex.into();
        let re = Regex::new(r"^[0-9a-f]+$").expect("invalid regex");
        if hex.len() != alg.hex_len() || !re.is_match(&hex) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: hex,
            });
        }
        Ok(Digest { alg, hex })
    }

    /// Hashes `bytes` with `alg`.
    pub fn compute(alg: DigestAlg, bytes: &[u8]) -> Self {
        let hex = match alg {
            DigestAlg::Sha1 => hex::encode(Sha1::digest(bytes)),
            DigestAlg::Sha256 => hex::encode(Sha256::digest(bytes)),
        };
        Digest { alg, hex }
    }

    /// SHA-1 of `bytes`.
    pub fn sha1(bytes: &[u8]) -> Self {
        Self::compute(DigestAlg::Sha1, bytes)
    }

    /// SHA-256 of `bytes`.
    pub fn sha256(bytes: &[u8]) -> Self {
        Self::compute(DigestAlg::Sha256, bytes)
    }

    /// Raw digest bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alg.as_str(), self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            Digest::sha1(b"abc").hex,
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            Digest::sha256(b"abc").hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn rejects_wrong_length_or_case() {
        assert!(Digest::new(DigestAlg::Sha1, "abc").is_err());
        assert!(Digest::new(DigestAlg::Sha1, "A9993E364706816ABA3E25717850C26C9CD0D89D").is_err());
        assert!(Digest::new(DigestAlg::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d").is_ok());
    }

    #[test]
    fn displays_with_algorithm() {
        let digest = Digest::sha1(b"");
        assert_eq!(
            digest.to_string(),
            "sha-1:da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(digest.to_bytes().unwrap().len(), 20);
    }
}
