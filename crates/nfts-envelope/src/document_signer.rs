//! Whole-document enveloped signature.
//!
//! This is an optional layer on top of the per-unit signatures. Callers check
//! [`DocumentSigner::available`] first and treat a failure as a warning.

use nfts_canonical::{parse_document, DocumentError, Element};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// XML-DSig namespace.
pub const DSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
/// Exclusive XML canonicalization.
pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
/// RSA with SHA-1 signature method.
pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
/// SHA-1 digest method.
pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
/// Enveloped-signature transform.
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// PEM files handed to the external signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    /// Unencrypted private key PEM.
    pub private_key: PathBuf,
    /// Certificate PEM placed in `X509Data`.
    pub certificate: PathBuf,
}

/// Errors from a whole-document signer.
#[derive(Error, Debug)]
pub enum DocumentSignError {
    /// Temporary files could not be written or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The external tool reported a failure.
    #[error("{tool} exited with {status}: {stderr}")]
    Backend {
        /// Tool name.
        tool: String,
        /// Exit status as text.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The tool produced something that is not a document.
    #[error("signed document is unreadable: {0}")]
    Document(#[from] DocumentError),
}

/// Capability to sign a whole document.
pub trait DocumentSigner {
    /// Short name for messages.
    fn name(&self) -> &str;

    /// Whether [`DocumentSigner::sign`] can be attempted.
    fn available(&self) -> bool;

    /// Returns the serialized document with an enveloped signature appended
    /// to its root.
    fn sign(&self, document: &Element, keys: &KeyPaths) -> Result<Vec<u8>, DocumentSignError>;
}

/// Signer backed by the `xmlsec1` command-line tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xmlsec1 {
    binary: PathBuf,
}

impl Default for Xmlsec1 {
    fn default() -> Self {
        Self::new("xmlsec1")
    }
}

impl Xmlsec1 {
    /// Uses the given `xmlsec1` binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Path or name of the binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl DocumentSigner for Xmlsec1 {
    fn name(&self) -> &str {
        "xmlsec1"
    }

    fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    fn sign(&self, document: &Element, keys: &KeyPaths) -> Result<Vec<u8>, DocumentSignError> {
        let dir = tempfile::tempdir()?;
        let template_path = dir.path().join("template.xml");
        let signed_path = dir.path().join("signed.xml");

        let mut template = document.clone();
        template.children.push(signature_template());
        std::fs::write(&template_path, template.to_document_bytes())?;

        let mut key_arg = keys.private_key.clone().into_os_string();
        key_arg.push(",");
        key_arg.push(&keys.certificate);

        debug!(binary = %self.binary.display(), "running xmlsec1 --sign");
        let output = Command::new(&self.binary)
            .arg("--sign")
            .arg("--privkey-pem")
            .arg(&key_arg)
            .arg("--output")
            .arg(&signed_path)
            .arg(&template_path)
            .output()?;
        if !output.status.success() {
            return Err(DocumentSignError::Backend {
                tool: self.name().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let signed = std::fs::read(&signed_path)?;
        // Re-serialize so the output carries the same declaration as unsigned documents.
        Ok(parse_document(&signed)?.to_document_bytes())
    }
}

/// Enveloped signature template with empty digest and signature values.
pub fn signature_template() -> Element {
    let ds = |local: &str| Element::new(format!("ds:{local}"));
    let algorithm = |local: &str, uri: &str| ds(local).attribute("Algorithm", uri);

    let reference = ds("Reference")
        .attribute("URI", "")
        .child(ds("Transforms").child(algorithm("Transform", ENVELOPED_SIGNATURE)))
        .child(algorithm("DigestMethod", SHA1))
        .child(ds("DigestValue"));
    let signed_info = ds("SignedInfo")
        .child(algorithm("CanonicalizationMethod", EXCLUSIVE_C14N))
        .child(algorithm("SignatureMethod", RSA_SHA1))
        .child(reference);

    ds("Signature")
        .attribute("xmlns:ds", DSIG_NAMESPACE)
        .child(signed_info)
        .child(ds("SignatureValue"))
        .child(ds("KeyInfo").child(ds("X509Data")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_enveloped_rsa_sha1() {
        let xml = signature_template().to_fragment_string();
        assert!(xml.starts_with(r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#));
        assert!(xml.contains(r#"<ds:Reference URI="">"#));
        assert!(xml.contains(ENVELOPED_SIGNATURE));
        assert!(xml.contains(RSA_SHA1));
        assert!(xml.contains(EXCLUSIVE_C14N));
        assert!(xml.contains("<ds:KeyInfo><ds:X509Data/></ds:KeyInfo>"));
    }

    #[test]
    fn missing_binary_is_unavailable() {
        assert!(!Xmlsec1::new("/nonexistent/xmlsec1").available());
    }
}
