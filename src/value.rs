use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

/// Longest accepted value for string options (`--output`, `--kernel`).
pub const MAX_STR_LEN: usize = 1024;

/// Decode a non-negative decimal integer. Signs, hex and trailing text are rejected.
pub fn decode_uint<T>(text: &str) -> Result<T, String>
where
    T: FromStr<Err = ParseIntError>,
{
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected a non-negative decimal integer".to_string());
    }
    digits.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => "integer is too large for this option".to_string(),
        _ => format!("expected a non-negative decimal integer ({})", e),
    })
}

/// Decode a finite floating-point number in decimal or scientific notation.
pub fn decode_float(text: &str) -> Result<f64, String> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| "expected a number such as 0.001, -4 or 1e-3".to_string())?;
    check_finite(value)
}

pub fn check_finite(value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("expected a finite number, found {}", value))
    }
}

/// Decode a free-form name or path: non-blank and at most `MAX_STR_LEN` bytes.
pub fn decode_name(text: &str) -> Result<String, String> {
    check_name(text).map(str::to_string)
}

pub fn check_name(text: &str) -> Result<&str, String> {
    if text.trim().is_empty() {
        return Err("expected a non-empty value".to_string());
    }
    if text.len() > MAX_STR_LEN {
        return Err(format!(
            "value is {} bytes long, the limit is {}",
            text.len(),
            MAX_STR_LEN
        ));
    }
    Ok(text)
}

/// Split `text` on commas into exactly `N` fields.
pub fn split_fields<const N: usize>(text: &str) -> Option<[&str; N]> {
    let mut fields = [""; N];
    let mut parts = text.split(',');
    for slot in fields.iter_mut() {
        *slot = parts.next()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(fields)
}
