//! Per-document canonicalization reports.

use crate::identifiers::{FieldPath, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of a canonicalization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Every field normalized cleanly.
    Ok,
    /// At least one decimal field was passed through unparsed.
    Ambiguous,
}

/// Stable warning codes emitted by canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// A present field normalized to empty text and was omitted.
    PrunedField,
    /// A present group had no surviving children and was omitted.
    PrunedGroup,
    /// A decimal field could not be parsed and was emitted as cleaned text.
    UnparsedDecimal,
}

impl WarningCode {
    /// Stable textual code.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::PrunedField => "PrunedField",
            WarningCode::PrunedGroup => "PrunedGroup",
            WarningCode::UnparsedDecimal => "UnparsedDecimal",
        }
    }
}

/// Warning attached to a field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWarning {
    /// Warning code.
    pub code: WarningCode,
    /// Dotted path of the field inside the unit.
    pub path: FieldPath,
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code.as_str(), self.path)
    }
}

/// Diagnostic report produced with canonical bytes. It never affects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    /// Overall status.
    pub status: ReportStatus,
    /// Warnings in traversal order.
    pub warnings: Vec<ReportWarning>,
    /// Counters: `emitted_fields`, `pruned_fields`, `unparsed_decimals`.
    pub metrics: BTreeMap<String, u64>,
    /// Profile that produced the bytes.
    pub profile_id: ProfileId,
}

impl CanonicalReport {
    /// Empty report for a profile.
    pub fn new(profile_id: ProfileId) -> Self {
        let metrics = ["emitted_fields", "pruned_fields", "unparsed_decimals"]
            .into_iter()
            .map(|key| (key.to_string(), 0))
            .collect();
        Self {
            status: ReportStatus::Ok,
            warnings: vec![],
            metrics,
            profile_id,
        }
    }

    /// Records a warning and bumps the matching counter.
    pub fn warn(&mut self, code: WarningCode, path: FieldPath) {
        match code {
            WarningCode::PrunedField => self.bump("pruned_fields"),
            WarningCode::UnparsedDecimal => {
                self.status = ReportStatus::Ambiguous;
                self.bump("unparsed_decimals");
            }
            WarningCode::PrunedGroup => {}
        }
        self.warnings.push(ReportWarning { code, path });
    }

    /// Increments a counter.
    pub fn bump(&mut self, key: &str) {
        *self.metrics.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Reads a counter, zero when absent.
    pub fn metric(&self, key: &str) -> u64 {
        self.metrics.get(key).copied().unwrap_or(0)
    }

    /// Warnings rendered as `Code:path` strings.
    pub fn warning_codes(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
