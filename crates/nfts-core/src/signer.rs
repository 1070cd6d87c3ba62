use crate::errors::{KeyError, UnitError};
use crate::keys::{SigningMaterial, VerificationKey};
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use rsa::Pkcs1v15Sign;
use sha1::{Digest as _, Sha1};

/// Signature scheme applied to canonical bytes. Not configurable.
pub const SIGNATURE_ALGORITHM: &str = "RSASSA-PKCS1-v1_5 / SHA-1";

/// Standard alphabet with padding; nonzero bits after the last symbol are ignored.
const SIGNATURE_TEXT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Raw signature bytes and their single-line base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Raw signature, as long as the key modulus.
    pub raw: Vec<u8>,
    /// Standard base64 with padding, no whitespace.
    pub encoded: String,
}

impl Signature {
    /// Wraps raw signature bytes.
    pub fn from_raw(raw: Vec<u8>) -> Self {
        let encoded = STANDARD.encode(&raw);
        Self { raw, encoded }
    }

    /// Decodes signature text; all whitespace is ignored.
    pub fn decode(text: &str) -> Result<Self, UnitError> {
        let encoded: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = SIGNATURE_TEXT
            .decode(&encoded)
            .map_err(|e| UnitError::MalformedSignature(e.to_string()))?;
        Ok(Self { raw, encoded })
    }
}

/// Signs canonical bytes with a shared private key.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'k> {
    material: &'k SigningMaterial,
}

impl<'k> Signer<'k> {
    /// Creates a signer over borrowed key material.
    pub fn new(material: &'k SigningMaterial) -> Self {
        Self { material }
    }

    /// Signs `canonical` with RSASSA-PKCS1-v1_5 over SHA-1.
    pub fn sign(&self, canonical: &[u8]) -> Result<Signature, KeyError> {
        let hashed = Sha1::digest(canonical);
        let raw = self
            .material
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha1>(), &hashed)
            .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(Signature::from_raw(raw))
    }
}

/// Checks `signature` over `canonical`; true when it verifies.
pub fn verify_signature(key: &VerificationKey, canonical: &[u8], signature: &[u8]) -> bool {
    let hashed = Sha1::digest(canonical);
    key.public_key
        .verify(Pkcs1v15Sign::new::<Sha1>(), &hashed, signature)
        .is_ok()
}
