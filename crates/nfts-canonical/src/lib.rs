//! Canonical data model for NFTS record-unit signing.
//!
//! A record unit (`<NFTS>`) is signed over its `tpNFTS` canonical form: the
//! schema-ordered subset of its fields, each normalized by a field-type rule,
//! serialized without declaration, attributes or whitespace. The bytes must
//! match the ones produced by the municipal reference implementation exactly,
//! so every rule that affects them lives in this crate.
//!
#![deny(missing_docs)]

/// Canonical builder and canonical node tree.
pub mod canonicalizer;
/// Decimal literal parsing and fixed/shortest rendering.
pub mod decimal;
/// Digest primitives used for diagnostics and fingerprints.
pub mod digest;
/// Owned XML element tree with parser and serializer.
pub mod element;
/// Profile and path identifiers.
pub mod identifiers;
/// Field normalizers keyed by normalization kind.
pub mod normalize;
/// Reports emitted alongside canonical bytes.
pub mod report;
/// Static schema descriptors for the supported profiles.
pub mod schema;
/// Validation errors for identifiers and digests.
pub mod validation;

pub use canonicalizer::{CanonicalNode, CanonicalTree, CanonicalizationResult, Canonicalizer};
pub use digest::{Digest, DigestAlg};
pub use element::{parse_document, DocumentError, Element};
pub use identifiers::{FieldPath, ProfileId};
pub use normalize::{NormalizationKind, Normalized};
pub use report::{CanonicalReport, ReportStatus, ReportWarning, WarningCode};
pub use schema::{FieldSpec, GroupSpec, SchemaDescriptor, SchemaEntry};
pub use validation::ValidationError;
