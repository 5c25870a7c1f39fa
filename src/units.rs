//! Conversions applied to raw server values before they are exposed.
//!
//! None of these fail. A value that cannot be interpreted as a number is
//! handed back unchanged.

use super::*;

pub const HASHES_PER_TERAHASH: f64 = 1e12;

/// Interprets a JSON number or numeric string as a finite `f64`.
pub fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// H/s to TH/s, two decimals.
pub fn terahash(hashes_per_second: f64) -> f64 {
    round_to(hashes_per_second / HASHES_PER_TERAHASH, 2)
}

pub fn to_terahash_per_second(raw: Option<&Value>) -> Option<Value> {
    let raw = raw?;

    Some(match numeric(raw) {
        Some(hashes) => json!(terahash(hashes)),
        None => raw.clone(),
    })
}

/// Rounds to the nearest integer, ties to even.
pub fn format_difficulty(raw: Option<&Value>) -> Option<Value> {
    let raw = raw?;

    let Some(difficulty) = numeric(raw) else {
        return Some(raw.clone());
    };

    let rounded = difficulty.round_ties_even();

    Some(if rounded.abs() < i64::MAX as f64 {
        Value::from(rounded as i64)
    } else {
        json!(rounded)
    })
}
