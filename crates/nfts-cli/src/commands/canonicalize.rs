//! Canonicalize command implementation.

use super::read_document;
use crate::config::Config;
use crate::output::format_warnings;
use nfts_canonical::Digest;
use nfts_core::record_units;
use serde_json::json;
use std::path::PathBuf;

pub fn run(
    config: &Config,
    input: PathBuf,
    profile: Option<String>,
    unit: Option<usize>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let canonicalizer = config.canonicalizer(profile.as_deref())?;
    let document = read_document(&input, &canonicalizer)?;

    let units = record_units(&document, &canonicalizer);
    if units.is_empty() {
        return Err(format!(
            "No <{}> elements found in {}",
            canonicalizer.schema().unit,
            input.display()
        )
        .into());
    }

    let selected: Vec<(usize, _)> = match unit {
        Some(n) if n == 0 || n > units.len() => {
            return Err(format!("Unit {} out of range (1..={})", n, units.len()).into());
        }
        Some(n) => vec![(n, units[n - 1])],
        None => units.into_iter().enumerate().map(|(i, u)| (i + 1, u)).collect(),
    };

    let mut results = Vec::new();
    for (index, element) in selected {
        let result = canonicalizer.canonicalize(element);
        if json_output {
            results.push(json!({
                "unit": index,
                "canonical": String::from_utf8_lossy(&result.bytes),
                "canonical_len": result.bytes.len(),
                "canonical_digest": Digest::sha1(&result.bytes),
                "report": result.report,
            }));
        } else {
            println!(
                "# NFTS {} ({} bytes, {}) warnings: {}",
                index,
                result.bytes.len(),
                Digest::sha1(&result.bytes),
                format_warnings(&result.report)
            );
            println!("{}", String::from_utf8_lossy(&result.bytes));
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}
