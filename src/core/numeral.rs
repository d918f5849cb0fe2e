//! Purpose: Strict decimal numeral parsing for query values and coordinate segments.
//! Exports: `parse_numeral`, `parse_numeral_value`, `canonical_numeral`.
//! Role: Single numeric gate shared by the scalar and geographic decoders.
//! Invariants: A token is numeric only if its canonical rendering equals the trimmed token.
//! Invariants: Non-finite values are never produced.
//! Notes: Canonical rendering follows the shortest round-trip digits with plain notation
//! for decimal exponents in [-6, 21), exponent notation outside it.

use serde_json::Value;

const PLAIN_EXPONENT_MIN: i32 = -6;
const PLAIN_EXPONENT_MAX: i32 = 21;

/// Parses `token` as a number, rejecting anything that does not render back verbatim.
///
/// `"42"` and `" 3.14 "` parse; `"3abc"`, `"5.0"`, `"+5"`, `""` and `"inf"` do not.
pub fn parse_numeral(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    if canonical_numeral(value) != trimmed {
        return None;
    }
    Some(value)
}

/// Loosely-typed entry point: only JSON strings are candidates.
pub fn parse_numeral_value(value: &Value) -> Option<f64> {
    match value {
        Value::String(token) => parse_numeral(token),
        _ => None,
    }
}

pub fn canonical_numeral(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_sign_negative() {
        return format!("-{}", canonical_numeral(-value));
    }
    if value.is_infinite() {
        return "Infinity".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e3`.
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent = exponent.parse::<i32>().unwrap_or(0);
    layout_digits(&digits, exponent + 1)
}

// `point` is the position of the decimal point relative to the first digit.
fn layout_digits(digits: &str, point: i32) -> String {
    let len = digits.len() as i32;
    if len <= point && point <= PLAIN_EXPONENT_MAX {
        let mut out = digits.to_string();
        out.extend(std::iter::repeat_n('0', (point - len) as usize));
        return out;
    }
    if 0 < point && point <= PLAIN_EXPONENT_MAX {
        let (int_part, frac_part) = digits.split_at(point as usize);
        return format!("{int_part}.{frac_part}");
    }
    if PLAIN_EXPONENT_MIN < point && point <= 0 {
        let zeros = "0".repeat((-point) as usize);
        return format!("0.{zeros}{digits}");
    }

    let exponent = point - 1;
    let sign = if exponent < 0 { '-' } else { '+' };
    let magnitude = exponent.unsigned_abs();
    let (lead, rest) = digits.split_at(1);
    if rest.is_empty() {
        format!("{lead}e{sign}{magnitude}")
    } else {
        format!("{lead}.{rest}e{sign}{magnitude}")
    }
}
