//! YAML configuration.
//!
//! ```yaml
//! profile: nfts-tpnfts-serie-padded
//! debug_dir: nfts_debug
//! envelope:
//!   operation: TesteEnvioLoteNFTSRequest
//!   schema_version: "2"
//! document_signature:
//!   enabled: false
//!   xmlsec_binary: xmlsec1
//! ```
//!
//! Every field is optional. Command-line flags override file values.

use nfts_canonical::schema::DEFAULT_PROFILE;
use nfts_canonical::{Canonicalizer, ProfileId};
use nfts_envelope::soap::{DEFAULT_OPERATION, DEFAULT_SCHEMA_VERSION};
use nfts_envelope::SoapEnvelope;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Schema profile id.
    pub profile: String,
    /// Directory for per-unit debug files.
    pub debug_dir: Option<PathBuf>,
    pub envelope: EnvelopeConfig,
    pub document_signature: DocumentSignatureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            debug_dir: None,
            envelope: EnvelopeConfig::default(),
            document_signature: DocumentSignatureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeConfig {
    pub operation: String,
    pub schema_version: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            operation: DEFAULT_OPERATION.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentSignatureConfig {
    pub enabled: bool,
    pub xmlsec_binary: PathBuf,
}

impl Default for DocumentSignatureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            xmlsec_binary: PathBuf::from("xmlsec1"),
        }
    }
}

impl Config {
    /// Loads `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.canonicalizer(None)
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.envelope()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        Ok(())
    }

    /// Canonicalizer for the configured profile, or for `override_profile`.
    pub fn canonicalizer(
        &self,
        override_profile: Option<&str>,
    ) -> Result<Canonicalizer, Box<dyn std::error::Error>> {
        let profile = ProfileId::parse(override_profile.unwrap_or(&self.profile))?;
        Ok(Canonicalizer::for_profile(&profile)?)
    }

    pub fn envelope(&self) -> Result<SoapEnvelope, nfts_envelope::EnvelopeError> {
        SoapEnvelope::new(&self.envelope.operation, &self.envelope.schema_version)
    }

    /// Debug directory from the flag, falling back to the file.
    pub fn debug_dir(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.debug_dir.clone())
    }
}
