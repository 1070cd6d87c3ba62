//! Signing and verification of NFTS record units.
//!
//! Each `<NFTS>` unit is signed with RSASSA-PKCS1-v1_5 over SHA-1 of its
//! canonical `tpNFTS` bytes; the base64 signature is stored in the unit's
//! `Assinatura` field and the unit is rewritten in full-record order.
//!
//! Core invariants:
//! - The signature covers exactly the canonical bytes, never the document bytes
//! - Key material is read-only and shared by every unit of a run
//! - A failing unit never stops the remaining units
//!
#![deny(missing_docs)]

/// Document-level signing and verification.
pub mod batch;
/// Error types for core operations.
pub mod errors;
/// Key material decoding and key identifiers.
pub mod keys;
/// Signature field insertion and full-record reordering.
pub mod reassembly;
/// Fixed signature scheme.
pub mod signer;
/// Unit verification and diagnostics.
pub mod verification;

pub use batch::{
    record_units, sign_document, verify_document, SignedUnit, SigningReport, UnitSigning,
    UnitVerification, VerificationReport,
};
pub use errors::{CoreError, KeyError, UnitError};
pub use keys::{CertificateInfo, KeyId, KeyMaterialProvider, SigningMaterial, VerificationKey};
pub use reassembly::{Reassembler, ReassemblyReport};
pub use signer::{Signature, Signer, SIGNATURE_ALGORITHM};
pub use verification::{Diagnostics, VerificationVerdict, VerifiedUnit, Verifier};
