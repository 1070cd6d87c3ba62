//! File-backed key material.

use nfts_core::{KeyError, KeyMaterialProvider, SigningMaterial, VerificationKey};
use std::fs;
use std::path::{Path, PathBuf};

/// Private key and certificate read from PEM files.
#[derive(Debug, Clone, Default)]
pub struct PemKeystore {
    pub key: Option<PathBuf>,
    pub cert: Option<PathBuf>,
}

impl PemKeystore {
    pub fn for_signing(key: PathBuf, cert: Option<PathBuf>) -> Self {
        Self {
            key: Some(key),
            cert,
        }
    }

    pub fn for_verification(cert: PathBuf) -> Self {
        Self {
            key: None,
            cert: Some(cert),
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, KeyError> {
    fs::read(path).map_err(|e| KeyError::Keystore(format!("cannot read {}: {}", path.display(), e)))
}

impl KeyMaterialProvider for PemKeystore {
    fn signing_material(&self) -> Result<SigningMaterial, KeyError> {
        let key_path = self
            .key
            .as_deref()
            .ok_or_else(|| KeyError::Keystore("no private key configured".into()))?;
        let key_pem = String::from_utf8(read(key_path)?).map_err(|_| {
            KeyError::Keystore(format!("{} is not a PEM file", key_path.display()))
        })?;
        let cert_pem = self.cert.as_deref().map(read).transpose()?;
        SigningMaterial::from_pem(&key_pem, cert_pem.as_deref())
    }

    fn verification_key(&self) -> Result<VerificationKey, KeyError> {
        let cert_path = self
            .cert
            .as_deref()
            .ok_or_else(|| KeyError::Keystore("no certificate configured".into()))?;
        VerificationKey::from_bytes(&read(cert_path)?)
    }
}
