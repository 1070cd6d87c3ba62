//! Document-level signing and verification.
//!
//! Units are independent: they fan out on the rayon pool and results come back
//! in document order with 1-based indices. Only a document without units is
//! fatal; every other failure stays attached to its unit.

use crate::errors::{CoreError, UnitError};
use crate::reassembly::{Reassembler, ReassemblyReport};
use crate::signer::{Signature, Signer};
use crate::verification::{VerificationVerdict, VerifiedUnit, Verifier};
use nfts_canonical::{CanonicalReport, CanonicalizationResult, Canonicalizer, Element};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Record units of a document in document order.
pub fn record_units<'a>(root: &'a Element, canonicalizer: &Canonicalizer) -> Vec<&'a Element> {
    root.descendants_named(canonicalizer.schema().unit)
}

/// A unit that was signed and rewritten.
#[derive(Debug, Clone)]
pub struct SignedUnit {
    /// Canonical bytes and report.
    pub canonical: CanonicalizationResult,
    /// Signature written into the unit.
    pub signature: Signature,
    /// Changes made while reassembling the unit.
    pub reassembly: ReassemblyReport,
}

/// Signing outcome for one unit.
#[derive(Debug)]
pub struct UnitSigning {
    /// 1-based position of the unit in the document.
    pub index: usize,
    /// Signed unit, or the reason it was left untouched.
    pub outcome: Result<SignedUnit, UnitError>,
}

/// Signing outcome for a document.
#[derive(Debug)]
pub struct SigningReport {
    /// Per-unit outcomes in document order.
    pub units: Vec<UnitSigning>,
}

impl SigningReport {
    /// Units signed successfully.
    pub fn signed(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_ok()).count()
    }

    /// Units that failed.
    pub fn failed(&self) -> usize {
        self.units.len() - self.signed()
    }
}

/// Signs every record unit of `root` in place.
pub fn sign_document(
    root: &mut Element,
    canonicalizer: &Canonicalizer,
    signer: &Signer<'_>,
    reassembler: &Reassembler,
) -> Result<SigningReport, CoreError> {
    let schema = canonicalizer.schema();
    let units = root.descendants_named_mut(schema.unit);
    if units.is_empty() {
        return Err(CoreError::NoRecordUnits(schema.unit));
    }
    info!(units = units.len(), profile = schema.profile, "signing record units");

    let units: Vec<UnitSigning> = units
        .into_par_iter()
        .enumerate()
        .map(|(i, unit)| {
            let index = i + 1;
            let outcome = sign_unit(unit, index, canonicalizer, signer, reassembler);
            if let Err(e) = &outcome {
                warn!(unit = index, error = %e, "unit not signed");
            }
            UnitSigning { index, outcome }
        })
        .collect();
    Ok(SigningReport { units })
}

fn sign_unit(
    unit: &mut Element,
    index: usize,
    canonicalizer: &Canonicalizer,
    signer: &Signer<'_>,
    reassembler: &Reassembler,
) -> Result<SignedUnit, UnitError> {
    let canonical = canonicalizer.canonicalize(unit);
    log_report(index, &canonical.report);
    let signature = signer.sign(&canonical.bytes)?;
    let reassembly = reassembler.reassemble(unit, &signature.encoded);
    if !reassembly.unordered.is_empty() {
        warn!(unit = index, fields = ?reassembly.unordered, "fields outside the record order kept at the end");
    }
    debug!(
        unit = index,
        canonical_len = canonical.bytes.len(),
        signature_len = signature.raw.len(),
        "unit signed"
    );
    Ok(SignedUnit {
        canonical,
        signature,
        reassembly,
    })
}

fn log_report(index: usize, report: &CanonicalReport) {
    for warning in &report.warnings {
        warn!(unit = index, warning = %warning, "canonicalization warning");
    }
}

/// Verification outcome for one unit.
#[derive(Debug)]
pub struct UnitVerification {
    /// 1-based position of the unit in the document.
    pub index: usize,
    /// Verified unit, or the reason it was skipped.
    pub outcome: Result<VerifiedUnit, UnitError>,
}

/// Verification outcome for a document.
#[derive(Debug)]
pub struct VerificationReport {
    /// Per-unit outcomes in document order.
    pub units: Vec<UnitVerification>,
}

impl VerificationReport {
    fn count(&self, valid: bool) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(&u.outcome, Ok(v) if v.verdict.is_valid() == valid))
            .count()
    }

    /// Units whose signature verified.
    pub fn valid(&self) -> usize {
        self.count(true)
    }

    /// Units whose signature did not verify.
    pub fn invalid(&self) -> usize {
        self.count(false)
    }

    /// Units skipped for a missing or malformed signature.
    pub fn skipped(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_err()).count()
    }

    /// Whether every unit verified.
    pub fn all_valid(&self) -> bool {
        self.valid() == self.units.len()
    }
}

/// Verifies every record unit of `root`.
pub fn verify_document(
    root: &Element,
    verifier: &Verifier<'_>,
) -> Result<VerificationReport, CoreError> {
    let units = record_units(root, verifier.canonicalizer());
    let unit_name = verifier.canonicalizer().schema().unit;
    if units.is_empty() {
        return Err(CoreError::NoRecordUnits(unit_name));
    }
    info!(units = units.len(), key = %verifier.key().key_id, "verifying record units");

    let units: Vec<UnitVerification> = units
        .into_par_iter()
        .enumerate()
        .map(|(i, unit)| {
            let index = i + 1;
            let outcome = verifier.verify_unit(unit);
            match &outcome {
                Ok(verified) => {
                    log_report(index, &verified.canonical.report);
                    match &verified.verdict {
                        VerificationVerdict::Valid => debug!(unit = index, "signature valid"),
                        VerificationVerdict::Invalid(d) => warn!(
                            unit = index,
                            digest = %d.canonical_digest,
                            signature_len = d.signature_len,
                            "signature invalid"
                        ),
                    }
                }
                Err(e) => warn!(unit = index, error = %e, "unit skipped"),
            }
            UnitVerification { index, outcome }
        })
        .collect();
    Ok(VerificationReport { units })
}
