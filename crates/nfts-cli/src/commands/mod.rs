//! Subcommand implementations.

pub mod canonicalize;
pub mod compare;
pub mod sign;
pub mod verify;

use nfts_canonical::{parse_document, Canonicalizer, Element};
use nfts_envelope::unwrap_message;
use std::path::Path;
use tracing::debug;

/// Reads a batch document from `path`.
///
/// A SOAP request without record units of its own is opened and the carried
/// document is returned instead.
pub(crate) fn read_document(
    path: &Path,
    canonicalizer: &Canonicalizer,
) -> Result<Element, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read file {}: {}", path.display(), e))?;
    let root = parse_document(&bytes)
        .map_err(|e| format!("Invalid document {}: {}", path.display(), e))?;

    if !nfts_core::record_units(&root, canonicalizer).is_empty() {
        return Ok(root);
    }
    match unwrap_message(&root) {
        Some(message) => {
            debug!(path = %path.display(), "reading document from MensagemXML");
            Ok(message?)
        }
        None => Ok(root),
    }
}
