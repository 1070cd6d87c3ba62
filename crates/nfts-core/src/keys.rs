//! Key material.
//!
//! Credential containers are decoded outside this crate; here key material
//! arrives as PEM (or DER for certificates) and is turned into typed RSA keys.

use crate::errors::KeyError;
use nfts_canonical::Digest;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::der::{pem, Decode, DecodePem, Encode};
use rsa::pkcs8::{DecodePublicKey, PrivateKeyInfo};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use x509_cert::Certificate;

/// Identifier of the key used for a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyId {
    /// Certificate subject as an RFC 4514 string, when a certificate was used.
    pub subject: Option<String>,
    /// SHA-256 fingerprint of the certificate DER, or of the SPKI DER.
    pub fingerprint: Digest,
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{} ({})", subject, self.fingerprint),
            None => write!(f, "{}", self.fingerprint),
        }
    }
}

/// Decoded X.509 certificate with its RSA public key.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// RFC 4514 subject.
    pub subject: String,
    /// SHA-256 fingerprint of the certificate DER.
    pub fingerprint: Digest,
    /// Certificate DER.
    pub der: Vec<u8>,
    /// RSA public key from the subject public key info.
    pub public_key: RsaPublicKey,
}

impl CertificateInfo {
    /// Decodes a PEM certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        let cert = Certificate::from_pem(pem)
            .map_err(|e| KeyError::Keystore(format!("invalid certificate PEM: {e}")))?;
        Self::from_certificate(&cert)
    }

    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let cert = Certificate::from_der(der)
            .map_err(|e| KeyError::Keystore(format!("invalid certificate DER: {e}")))?;
        Self::from_certificate(&cert)
    }

    fn from_certificate(cert: &Certificate) -> Result<Self, KeyError> {
        let der = cert
            .to_der()
            .map_err(|e| KeyError::Keystore(format!("cannot encode certificate: {e}")))?;
        let spki = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| KeyError::Keystore(format!("cannot encode public key: {e}")))?;
        let public_key = RsaPublicKey::from_public_key_der(&spki)
            .map_err(|e| KeyError::Mismatch(format!("certificate key is not RSA: {e}")))?;
        Ok(Self {
            subject: cert.tbs_certificate.subject.to_string(),
            fingerprint: Digest::sha256(&der),
            der,
            public_key,
        })
    }
}

/// Private key plus optional certificate, used for signing.
pub struct SigningMaterial {
    /// RSA private key.
    pub private_key: RsaPrivateKey,
    /// Certificate matching the private key, when supplied.
    pub certificate: Option<CertificateInfo>,
}

impl fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("private_key", &"<redacted>")
            .field("certificate", &self.certificate.as_ref().map(|c| &c.subject))
            .finish()
    }
}

impl SigningMaterial {
    /// Reads a PKCS#8 or PKCS#1 PEM private key and an optional PEM certificate.
    ///
    /// Fails with [`KeyError::Mismatch`] for non-RSA keys and for a
    /// certificate whose public key differs from the private key.
    pub fn from_pem(key_pem: &str, cert_pem: Option<&[u8]>) -> Result<Self, KeyError> {
        let private_key = decode_private_key(key_pem)?;
        let certificate = cert_pem.map(CertificateInfo::from_pem).transpose()?;
        if let Some(cert) = &certificate {
            if cert.public_key != private_key.to_public_key() {
                return Err(KeyError::Mismatch(format!(
                    "private key does not belong to certificate '{}'",
                    cert.subject
                )));
            }
        }
        Ok(Self {
            private_key,
            certificate,
        })
    }

    /// Verification key for the public half of this material.
    pub fn verification_key(&self) -> Result<VerificationKey, KeyError> {
        match &self.certificate {
            Some(cert) => Ok(VerificationKey::from_certificate(cert.clone())),
            None => VerificationKey::from_public_key(self.private_key.to_public_key()),
        }
    }
}

fn decode_private_key(key_pem: &str) -> Result<RsaPrivateKey, KeyError> {
    let (label, der) = pem::decode_vec(key_pem.as_bytes())
        .map_err(|e| KeyError::Keystore(format!("invalid private key PEM: {e}")))?;
    match label {
        "PRIVATE KEY" => {
            let info = PrivateKeyInfo::try_from(der.as_slice())
                .map_err(|e| KeyError::Keystore(format!("invalid PKCS#8 key: {e}")))?;
            if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
                return Err(KeyError::Mismatch(format!(
                    "private key algorithm {} is not RSA",
                    info.algorithm.oid
                )));
            }
            RsaPrivateKey::try_from(info)
                .map_err(|e| KeyError::Keystore(format!("invalid RSA key: {e}")))
        }
        "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_der(&der)
            .map_err(|e| KeyError::Keystore(format!("invalid PKCS#1 key: {e}"))),
        "ENCRYPTED PRIVATE KEY" => Err(KeyError::Keystore(
            "encrypted private keys are not supported; decrypt the key to PEM first".into(),
        )),
        other => Err(KeyError::Keystore(format!(
            "unexpected PEM label '{other}' for a private key"
        ))),
    }
}

/// Public key used to check signatures, with its identifier.
#[derive(Debug, Clone)]
pub struct VerificationKey {
    /// RSA public key.
    pub public_key: RsaPublicKey,
    /// Identifier reported in diagnostics.
    pub key_id: KeyId,
}

impl VerificationKey {
    /// Uses a decoded certificate.
    pub fn from_certificate(cert: CertificateInfo) -> Self {
        Self {
            key_id: KeyId {
                subject: Some(cert.subject),
                fingerprint: cert.fingerprint,
            },
            public_key: cert.public_key,
        }
    }

    /// Uses a bare public key, fingerprinted over its SPKI DER.
    pub fn from_public_key(public_key: RsaPublicKey) -> Result<Self, KeyError> {
        use rsa::pkcs8::EncodePublicKey;
        let spki = public_key
            .to_public_key_der()
            .map_err(|e| KeyError::Keystore(format!("cannot encode public key: {e}")))?;
        Ok(Self {
            key_id: KeyId {
                subject: None,
                fingerprint: Digest::sha256(spki.as_bytes()),
            },
            public_key,
        })
    }

    /// Reads a `CERTIFICATE` or `PUBLIC KEY` PEM.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, KeyError> {
        let (label, der) = pem::decode_vec(pem_bytes)
            .map_err(|e| KeyError::Keystore(format!("invalid PEM: {e}")))?;
        match label {
            "CERTIFICATE" => CertificateInfo::from_der(&der).map(Self::from_certificate),
            "PUBLIC KEY" => {
                let public_key = RsaPublicKey::from_public_key_der(&der)
                    .map_err(|e| KeyError::Mismatch(format!("public key is not RSA: {e}")))?;
                Ok(Self {
                    key_id: KeyId {
                        subject: None,
                        fingerprint: Digest::sha256(&der),
                    },
                    public_key,
                })
            }
            other => Err(KeyError::Keystore(format!(
                "unexpected PEM label '{other}' for a verification key"
            ))),
        }
    }

    /// Reads a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        CertificateInfo::from_der(der).map(Self::from_certificate)
    }

    /// Reads a certificate or public key, PEM or DER.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.trim_ascii_start().starts_with(b"-----BEGIN") {
            Self::from_pem(bytes)
        } else {
            Self::from_der(bytes)
        }
    }
}

/// Source of already-decoded key material.
///
/// Implementations own the I/O; a failure here aborts the run before any
/// unit is canonicalized.
pub trait KeyMaterialProvider {
    /// Private key (and certificate) for signing.
    fn signing_material(&self) -> Result<SigningMaterial, KeyError>;

    /// Public key for verification.
    fn verification_key(&self) -> Result<VerificationKey, KeyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = include_str!("../tests/fixtures/signer_key.pem");
    const CERT: &[u8] = include_bytes!("../tests/fixtures/signer_cert.pem");

    #[test]
    fn key_id_display_includes_subject_and_fingerprint() {
        let key = VerificationKey::from_pem(CERT).unwrap();
        let shown = key.key_id.to_string();
        assert!(shown.contains("TOMADOR EXEMPLO LTDA"));
        assert!(shown.contains("(sha-256:"));
    }

    #[test]
    fn signing_material_debug_hides_key() {
        let material = SigningMaterial::from_pem(KEY, Some(CERT)).unwrap();
        let shown = format!("{material:?}");
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains("BEGIN"));
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(matches!(
            SigningMaterial::from_pem("not a key", None),
            Err(KeyError::Keystore(_))
        ));
        assert!(matches!(
            VerificationKey::from_bytes(b"\x30\x03\x02\x01\x00"),
            Err(KeyError::Keystore(_))
        ));
    }
}
