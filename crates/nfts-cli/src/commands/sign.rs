//! Sign command implementation.

use super::read_document;
use crate::artifacts::DebugArtifacts;
use crate::config::Config;
use crate::keystore::PemKeystore;
use crate::output::{format_warnings, print_table_header, truncate};
use nfts_canonical::{Digest, Element};
use nfts_core::{
    sign_document, KeyMaterialProvider, Reassembler, Signer, SigningReport, SIGNATURE_ALGORITHM,
};
use nfts_envelope::{DocumentSigner, KeyPaths, Xmlsec1};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub key: PathBuf,
    pub cert: Option<PathBuf>,
    pub profile: Option<String>,
    pub debug_dir: Option<PathBuf>,
    pub no_envelope: bool,
    pub document_signature: bool,
    pub json: bool,
}

pub fn run(config: &Config, options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let canonicalizer = config.canonicalizer(options.profile.as_deref())?;
    let keystore = PemKeystore::for_signing(options.key.clone(), options.cert.clone());
    let material = keystore.signing_material()?;
    let signer = Signer::new(&material);
    let reassembler = Reassembler::new(canonicalizer.schema());

    let mut document = read_document(&options.input, &canonicalizer)?;
    let report = sign_document(&mut document, &canonicalizer, &signer, &reassembler)?;

    if let Some(dir) = config.debug_dir(options.debug_dir.clone()) {
        let artifacts = DebugArtifacts::create(&dir)
            .map_err(|e| format!("Failed to create debug directory {}: {}", dir.display(), e))?;
        for unit in &report.units {
            if let Ok(signed) = &unit.outcome {
                artifacts.write_canonical(unit.index, &signed.canonical.bytes)?;
                artifacts.write_signature(unit.index, &signed.signature)?;
            }
        }
        info!(dir = %artifacts.dir().display(), "debug files written");
    }

    let signed_document = if options.document_signature || config.document_signature.enabled {
        sign_whole_document(config, &options, &document)
    } else {
        document.to_document_bytes()
    };

    let output_bytes = if options.no_envelope {
        signed_document
    } else {
        config.envelope()?.wrap(&String::from_utf8(signed_document)?)
    };
    std::fs::write(&options.output, output_bytes)
        .map_err(|e| format!("Failed to write {}: {}", options.output.display(), e))?;

    print_report(&report, &options)?;

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Adds the enveloped document signature, falling back to the unsigned
/// document on any failure.
fn sign_whole_document(config: &Config, options: &Options, document: &Element) -> Vec<u8> {
    let Some(certificate) = options.cert.clone() else {
        warn!("document signature skipped: --cert is required");
        return document.to_document_bytes();
    };
    let signer = Xmlsec1::new(config.document_signature.xmlsec_binary.clone());
    if !signer.available() {
        warn!(
            binary = %signer.binary().display(),
            "document signature skipped: xmlsec1 not available"
        );
        return document.to_document_bytes();
    }
    let keys = KeyPaths {
        private_key: options.key.clone(),
        certificate,
    };
    match signer.sign(document, &keys) {
        Ok(bytes) => {
            info!("document signature added");
            bytes
        }
        Err(e) => {
            warn!(error = %e, "document signature failed");
            document.to_document_bytes()
        }
    }
}

fn print_report(
    report: &SigningReport,
    options: &Options,
) -> Result<(), Box<dyn std::error::Error>> {
    if options.json {
        let units: Vec<_> = report
            .units
            .iter()
            .map(|unit| match &unit.outcome {
                Ok(signed) => json!({
                    "unit": unit.index,
                    "status": "signed",
                    "canonical_len": signed.canonical.bytes.len(),
                    "canonical_digest": Digest::sha1(&signed.canonical.bytes),
                    "signature_len": signed.signature.raw.len(),
                    "report": signed.canonical.report,
                    "reassembly": signed.reassembly,
                }),
                Err(e) => json!({
                    "unit": unit.index,
                    "status": "failed",
                    "error": e.to_string(),
                }),
            })
            .collect();
        let summary = json!({
            "output": options.output,
            "algorithm": SIGNATURE_ALGORITHM,
            "signed": report.signed(),
            "failed": report.failed(),
            "units": units,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_table_header(&format!(
        "{:<6} {:<8} {:<44} {}",
        "UNIT", "STATUS", "CANONICAL_SHA1", "WARNINGS"
    ));
    for unit in &report.units {
        match &unit.outcome {
            Ok(signed) => println!(
                "{:<6} {:<8} {:<44} {}",
                unit.index,
                "SIGNED",
                Digest::sha1(&signed.canonical.bytes).hex,
                format_warnings(&signed.canonical.report)
            ),
            Err(e) => println!(
                "{:<6} {:<8} {:<44} {}",
                unit.index,
                "FAILED",
                "-",
                truncate(&e.to_string(), 60)
            ),
        }
    }
    println!();
    println!("Signed {} of {} units", report.signed(), report.units.len());
    println!("Output: {}", options.output.display());
    Ok(())
}
