use crate::errors::UnitError;
use crate::keys::{KeyId, VerificationKey};
use crate::signer::{verify_signature, Signature};
use nfts_canonical::{CanonicalizationResult, Canonicalizer, Digest, Element};
use serde::{Deserialize, Serialize};

/// Data needed to compare a failed verification against another implementation
/// without repeating the cryptographic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// SHA-1 of the canonical bytes.
    pub canonical_digest: Digest,
    /// Length of the canonical bytes.
    pub canonical_len: usize,
    /// Length of the decoded signature.
    pub signature_len: usize,
    /// Key the signature was checked against.
    pub key_id: KeyId,
}

/// Outcome of checking one signed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "diagnostics")]
pub enum VerificationVerdict {
    /// The signature verifies over the canonical bytes.
    Valid,
    /// The signature does not verify.
    Invalid(Diagnostics),
}

impl VerificationVerdict {
    /// Whether the verdict is `Valid`.
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationVerdict::Valid)
    }

    /// Converts `Invalid` into [`UnitError::SignatureMismatch`].
    pub fn ensure_valid(self) -> Result<(), UnitError> {
        match self {
            VerificationVerdict::Valid => Ok(()),
            VerificationVerdict::Invalid(diagnostics) => {
                Err(UnitError::SignatureMismatch(Box::new(diagnostics)))
            }
        }
    }
}

/// A verified unit with the material that was checked.
#[derive(Debug, Clone)]
pub struct VerifiedUnit {
    /// Verdict.
    pub verdict: VerificationVerdict,
    /// Canonical bytes rebuilt from the unit.
    pub canonical: CanonicalizationResult,
    /// Decoded signature.
    pub signature: Signature,
}

/// Verifies signed units against one public key.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'k> {
    canonicalizer: Canonicalizer,
    key: &'k VerificationKey,
}

impl<'k> Verifier<'k> {
    /// Creates a verifier.
    pub fn new(canonicalizer: Canonicalizer, key: &'k VerificationKey) -> Self {
        Self { canonicalizer, key }
    }

    /// Canonicalizer in use.
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Key in use.
    pub fn key(&self) -> &VerificationKey {
        self.key
    }

    /// Verifies one unit.
    ///
    /// Missing or blank signature fields and undecodable signature text are
    /// errors; a signature that decodes but does not verify is an `Invalid`
    /// verdict.
    pub fn verify_unit(&self, unit: &Element) -> Result<VerifiedUnit, UnitError> {
        let field = self.canonicalizer.schema().signature;
        let text = unit
            .find_child(field)
            .map(Element::text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(UnitError::MissingSignature(field))?;
        let signature = Signature::decode(text)?;

        let canonical = self.canonicalizer.canonicalize(unit);
        let verdict = if verify_signature(self.key, &canonical.bytes, &signature.raw) {
            VerificationVerdict::Valid
        } else {
            VerificationVerdict::Invalid(Diagnostics {
                canonical_digest: Digest::sha1(&canonical.bytes),
                canonical_len: canonical.bytes.len(),
                signature_len: signature.raw.len(),
                key_id: self.key.key_id.clone(),
            })
        };
        Ok(VerifiedUnit {
            verdict,
            canonical,
            signature,
        })
    }
}
