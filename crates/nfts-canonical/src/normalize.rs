//! Field normalizers.
//!
//! Every normalizer is total: malformed input never fails, it falls back to
//! the cleaned text. An empty result means "omit the field".

use crate::decimal::{
    decimal_digit_value, fold_decimal_digits, format_fixed, format_repr, parse_float_literal,
};
use serde::{Deserialize, Serialize};

/// Width of the `SerieNFTS` field in the padded profile.
pub const SERIES_WIDTH: usize = 5;

/// Lowercased tokens read as boolean true; anything else is false.
pub const TRUE_TOKENS: [&str; 7] = ["true", "1", "s", "sim", "t", "y", "yes"];

/// Normalization rule attached to a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationKind {
    /// Cleaned text.
    PlainText,
    /// Cleaned text, expected to be omitted when blank.
    OptionalText,
    /// Cleaned text; all-digit values lose their leading zeros.
    NumericString,
    /// Decimal with exactly two fractional digits.
    CurrencyDecimal,
    /// Decimal with its natural precision.
    PlainDecimal,
    /// `true` or `false`.
    Boolean,
    /// Cleaned text padded or truncated to [`SERIES_WIDTH`] characters.
    FixedWidthSeries,
}

/// Result of normalizing one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Normalized text; empty means the field is omitted.
    pub text: String,
    /// Set when a decimal field could not be parsed and was passed through.
    pub passed_through: bool,
}

impl Normalized {
    fn exact(text: String) -> Self {
        Self {
            text,
            passed_through: false,
        }
    }
}

impl NormalizationKind {
    /// Normalizes a raw field value.
    pub fn normalize(self, raw: &str) -> Normalized {
        match self {
            Self::PlainText | Self::OptionalText => Normalized::exact(clean(raw)),
            Self::NumericString => Normalized::exact(numeric_string(raw)),
            Self::CurrencyDecimal => decimal(raw, |v| format_fixed(v, 2)),
            Self::PlainDecimal => decimal(raw, format_repr),
            Self::Boolean => Normalized::exact(boolean(raw).to_string()),
            Self::FixedWidthSeries => Normalized::exact(fixed_width_series(raw)),
        }
    }

    /// Normalizes a raw field value, keeping only the text.
    pub fn apply(self, raw: &str) -> String {
        self.normalize(raw).text
    }
}

/// Whitespace as stripped by the reference implementation's `str.strip()`.
fn is_strip_whitespace(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Replaces non-breaking spaces with spaces and trims surrounding whitespace.
pub fn clean(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .trim_matches(is_strip_whitespace)
        .to_string()
}

/// Strips leading zeros from all-digit values (`"0007"` → `"7"`, `"000"` → `"0"`).
///
/// Digits in any script count and are rendered in ASCII (`"٠٠٧"` → `"7"`).
pub fn numeric_string(raw: &str) -> String {
    let cleaned = clean(raw);
    if cleaned.is_empty() || !cleaned.chars().all(|c| decimal_digit_value(c).is_some()) {
        return cleaned;
    }
    let digits = fold_decimal_digits(&cleaned);
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        "0".to_string()
    } else {
        significant.to_string()
    }
}

/// Decimal rule shared by the currency and plain variants.
///
/// Commas become periods before parsing, so `"1.234,56"` becomes `"1.234.56"`,
/// fails to parse and is passed through in that form.
fn decimal(raw: &str, render: impl Fn(f64) -> String) -> Normalized {
    let cleaned = raw
        .replace('\u{a0}', " ")
        .replace(',', ".")
        .trim_matches(is_strip_whitespace)
        .to_string();
    match parse_float_literal(&cleaned) {
        Some(value) => Normalized::exact(render(value)),
        None => Normalized {
            passed_through: !cleaned.is_empty(),
            text: cleaned,
        },
    }
}

/// Two-digit currency rendering (`" 3,5 "` → `"3.50"`).
pub fn currency_decimal(raw: &str) -> String {
    NormalizationKind::CurrencyDecimal.apply(raw)
}

/// Natural-precision rendering (`"03.025"` → `"3.025"`).
pub fn plain_decimal(raw: &str) -> String {
    NormalizationKind::PlainDecimal.apply(raw)
}

/// Folds boolean synonyms; empty and unknown values are false.
pub fn boolean(raw: &str) -> &'static str {
    let lowered = clean(raw).to_lowercase();
    if TRUE_TOKENS.contains(&lowered.as_str()) {
        "true"
    } else {
        "false"
    }
}

/// Pads with spaces or truncates to [`SERIES_WIDTH`] characters.
pub fn fixed_width_series(raw: &str) -> String {
    let cleaned = clean(raw);
    let mut series: String = cleaned.chars().take(SERIES_WIDTH).collect();
    let width = series.chars().count();
    series.extend(std::iter::repeat(' ').take(SERIES_WIDTH - width));
    series
}
