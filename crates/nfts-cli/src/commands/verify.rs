//! Verify command implementation.

use super::read_document;
use crate::artifacts::DebugArtifacts;
use crate::config::Config;
use crate::keystore::PemKeystore;
use crate::output::{print_table_header, truncate};
use nfts_canonical::Digest;
use nfts_core::{
    verify_document, KeyMaterialProvider, VerificationReport, VerificationVerdict, Verifier,
    SIGNATURE_ALGORITHM,
};
use serde_json::json;
use std::path::PathBuf;

pub fn run(
    config: &Config,
    input: PathBuf,
    cert: PathBuf,
    profile: Option<String>,
    debug_dir: Option<PathBuf>,
    strict: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let canonicalizer = config.canonicalizer(profile.as_deref())?;
    let key = PemKeystore::for_verification(cert).verification_key()?;
    let verifier = Verifier::new(canonicalizer, &key);

    let document = read_document(&input, &canonicalizer)?;
    let report = verify_document(&document, &verifier)?;

    if let Some(dir) = config.debug_dir(debug_dir) {
        let artifacts = DebugArtifacts::create(&dir)
            .map_err(|e| format!("Failed to create debug directory {}: {}", dir.display(), e))?;
        for unit in &report.units {
            if let Ok(verified) = &unit.outcome {
                artifacts.write_canonical(unit.index, &verified.canonical.bytes)?;
                artifacts.write_signature(unit.index, &verified.signature)?;
            }
        }
    }

    if json_output {
        print_json(&report, &key.key_id)?;
    } else {
        print_table(&report);
    }

    if strict && !report.all_valid() {
        for failure in strict_failures(&report) {
            eprintln!("Error: {}", failure);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// One line per unit that did not verify, skipped units included.
fn strict_failures(report: &VerificationReport) -> Vec<String> {
    report
        .units
        .iter()
        .filter_map(|unit| {
            let error = match &unit.outcome {
                Ok(verified) => verified.verdict.clone().ensure_valid().err()?.to_string(),
                Err(e) => e.to_string(),
            };
            Some(format!("unit {}: {}", unit.index, error))
        })
        .collect()
}

fn print_json(
    report: &VerificationReport,
    key_id: &nfts_core::KeyId,
) -> Result<(), Box<dyn std::error::Error>> {
    let units: Vec<_> = report
        .units
        .iter()
        .map(|unit| match &unit.outcome {
            Ok(verified) => json!({
                "unit": unit.index,
                "status": if verified.verdict.is_valid() { "valid" } else { "invalid" },
                "canonical_digest": Digest::sha1(&verified.canonical.bytes),
                "signature_len": verified.signature.raw.len(),
                "verdict": verified.verdict,
                "report": verified.canonical.report,
            }),
            Err(e) => json!({
                "unit": unit.index,
                "status": "skipped",
                "error": e.to_string(),
            }),
        })
        .collect();
    let summary = json!({
        "algorithm": SIGNATURE_ALGORITHM,
        "key_id": key_id,
        "valid": report.valid(),
        "invalid": report.invalid(),
        "skipped": report.skipped(),
        "units": units,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_table(report: &VerificationReport) {
    print_table_header(&format!(
        "{:<6} {:<8} {:<44} {}",
        "UNIT", "VERDICT", "CANONICAL_SHA1", "DETAILS"
    ));
    for unit in &report.units {
        match &unit.outcome {
            Ok(verified) => match &verified.verdict {
                VerificationVerdict::Valid => println!(
                    "{:<6} {:<8} {:<44} {} bytes",
                    unit.index,
                    "VALID",
                    Digest::sha1(&verified.canonical.bytes).hex,
                    verified.signature.raw.len()
                ),
                VerificationVerdict::Invalid(d) => println!(
                    "{:<6} {:<8} {:<44} {} bytes, key {}",
                    unit.index,
                    "INVALID",
                    d.canonical_digest.hex,
                    d.signature_len,
                    truncate(&d.key_id.to_string(), 60)
                ),
            },
            Err(e) => println!(
                "{:<6} {:<8} {:<44} {}",
                unit.index,
                "SKIPPED",
                "-",
                truncate(&e.to_string(), 60)
            ),
        }
    }
    println!();
    println!(
        "{} valid, {} invalid, {} skipped ({} units)",
        report.valid(),
        report.invalid(),
        report.skipped(),
        report.units.len()
    );
}
