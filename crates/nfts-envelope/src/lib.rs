//! Output layers around a signed NFTS document.
//!
//! - [`soap`]: the SOAP 1.1 request that carries the document as CDATA
//! - [`document_signer`]: optional enveloped XML-DSig over the whole document
//!
#![deny(missing_docs)]

/// Whole-document signature capability.
pub mod document_signer;
/// SOAP envelope builder and unwrapper.
pub mod soap;

pub use document_signer::{DocumentSignError, DocumentSigner, KeyPaths, Xmlsec1};
pub use soap::{unwrap_message, EnvelopeError, SoapEnvelope};
