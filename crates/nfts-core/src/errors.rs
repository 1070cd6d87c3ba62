use crate::verification::Diagnostics;
use thiserror::Error;

/// Key material errors. Both variants abort a run before any unit is processed.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Key or certificate material cannot be read or decoded.
    #[error("keystore error: {0}")]
    Keystore(String),
    /// The key is not an RSA key, or does not match the certificate.
    #[error("key mismatch: {0}")]
    Mismatch(String),
    /// The signature scheme rejected the private key.
    #[error("signing rejected by key: {0}")]
    Rejected(String),
}

/// Per-unit errors; the failing unit is reported and the run continues.
#[derive(Error, Debug)]
pub enum UnitError {
    /// The unit carries no signature field, or an empty one.
    #[error("no <{0}> in record unit")]
    MissingSignature(&'static str),
    /// The signature text is not strict standard base64.
    #[error("signature is not valid base64: {0}")]
    MalformedSignature(String),
    /// The signature does not verify over the canonical bytes.
    #[error("signature mismatch (sha-1 {}, {} signature bytes, key {})", .0.canonical_digest.hex, .0.signature_len, .0.key_id)]
    SignatureMismatch(Box<Diagnostics>),
    /// Signing the unit failed.
    #[error("signing failed: {0}")]
    Signing(#[from] KeyError),
}

/// Fatal errors for document-level operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The document contains no record unit.
    #[error("no <{0}> record units found in document")]
    NoRecordUnits(&'static str),
}
