//! Float literal parsing, two-decimal fixed rendering and shortest
//! round-trip rendering, matching the municipal reference signer.
//!
//! The receiving system hashes whatever text the reference produced, so the
//! accepted grammar and the rendered digits both have to agree with it, not
//! with Rust's own `f64` conventions (`"1_000"` parses, `3.0` renders `"3.0"`,
//! `1e16` renders `"1e+16"`).

use std::borrow::Cow;
use unicode_categories::UnicodeCategories;

/// Decimal exponents rendered in fixed notation by [`format_repr`].
const REPR_FIXED_EXPONENTS: std::ops::Range<i32> = -4..16;

/// Value of a decimal digit (general category Nd) in any script.
///
/// Nd digits come in contiguous runs of ten starting at zero, so the value is
/// the offset inside the run.
pub fn decimal_digit_value(c: char) -> Option<u32> {
    if c.is_ascii() {
        return c.to_digit(10);
    }
    if !c.is_number_decimal_digit() {
        return None;
    }
    let code = c as u32;
    let preceding = (1u32..)
        .take_while(|k| {
            code.checked_sub(*k)
                .and_then(char::from_u32)
                .is_some_and(|p| p.is_number_decimal_digit())
        })
        .count();
    Some(preceding as u32 % 10)
}

/// Replaces every decimal digit with its ASCII form (`"٣.٥"` → `"3.5"`).
pub fn fold_decimal_digits(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match decimal_digit_value(c) {
                Some(d) => char::from_digit(d, 10).unwrap_or(c),
                None => c,
            })
            .collect(),
    )
}

/// Parses a float literal.
///
/// Accepts an optional sign followed by `inf`, `infinity` or `nan` (any case),
/// or by digits with optional single underscores between them, an optional
/// fraction and an optional exponent. Digits may be in any script. Surrounding
/// whitespace is not accepted; callers clean the text first.
pub fn parse_float_literal(text: &str) -> Option<f64> {
    let folded = fold_decimal_digits(text);
    let text = folded.as_ref();
    let (negative, body) = match text.as_bytes().first() {
        Some(b'+') => (false, &text[1..]),
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    };
    let sign = if negative { -1.0 } else { 1.0 };

    match body.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => return Some(sign * f64::INFINITY),
        "nan" => return Some(f64::NAN),
        _ => {}
    }
    if !is_decimal_literal(body) {
        return None;
    }
    let digits: String = body.chars().filter(|&c| c != '_').collect();
    digits.parse::<f64>().ok().map(|v| sign * v)
}

fn is_decimal_literal(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut pos = 0;
    let integer = scan_digit_part(bytes, &mut pos);
    let mut fraction = false;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        fraction = scan_digit_part(bytes, &mut pos);
    }
    if !integer && !fraction {
        return false;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if !scan_digit_part(bytes, &mut pos) {
            return false;
        }
    }
    pos == bytes.len()
}

/// Consumes `digit ("_"? digit)*`; returns whether anything was consumed.
fn scan_digit_part(bytes: &[u8], pos: &mut usize) -> bool {
    if !bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
        return false;
    }
    *pos += 1;
    loop {
        match bytes.get(*pos) {
            Some(b) if b.is_ascii_digit() => *pos += 1,
            Some(b'_') if bytes.get(*pos + 1).is_some_and(u8::is_ascii_digit) => *pos += 2,
            _ => return true,
        }
    }
}

/// Renders with a fixed number of fractional digits (`"{:.Nf}"`).
pub fn format_fixed(value: f64, places: usize) -> String {
    if let Some(special) = format_special(value) {
        return special;
    }
    format!("{:.*}", places, value)
}

/// Renders the shortest round-trip representation, switching to exponent
/// notation outside `1e-4 <= |x| < 1e16`.
pub fn format_repr(value: f64) -> String {
    if let Some(special) = format_special(value) {
        return special;
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `-3.025e0`.
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    let digits: String = mantissa.chars().filter(|&c| c != '.').collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    if REPR_FIXED_EXPONENTS.contains(&exponent) {
        if exponent >= 0 {
            let integer_len = exponent as usize + 1;
            if digits.len() <= integer_len {
                out.push_str(&digits);
                out.push_str(&"0".repeat(integer_len - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..integer_len]);
                out.push('.');
                out.push_str(&digits[integer_len..]);
            }
        } else {
            out.push_str("0.");
            out.push_str(&"0".repeat((-exponent - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    }
    out
}

fn format_special(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("nan".to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        None
    }
}
