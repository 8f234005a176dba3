//! Presentation of a successful result as decimal, hex and binary text.

use crate::error::EvalError;
use num_bigint::{BigInt, Sign};
use num_traits::FromPrimitive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedResult {
    pub decimal: String,
    /// Present only for integral values.
    pub hex: Option<String>,
    /// Present only for integral values.
    pub binary: Option<String>,
}

impl FormattedResult {
    pub fn is_integral(&self) -> bool {
        self.hex.is_some()
    }

    /// Labelled rows for display, skipping hidden outputs.
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        let mut rows = vec![("Decimal", self.decimal.as_str())];
        if let Some(hex) = &self.hex {
            rows.push(("Hex", hex.as_str()));
        }
        if let Some(binary) = &self.binary {
            rows.push(("Binary", binary.as_str()));
        }
        rows
    }
}

/// Integral values get all three renderings; anything else only a decimal.
pub fn format_value(value: f64) -> FormattedResult {
    match BigInt::from_f64(value).filter(|_| is_integral(value)) {
        Some(integer) => {
            let bits = low_64_bits(&integer);
            FormattedResult {
                decimal: integer.to_string(),
                hex: Some(format!("{:#x}", bits)),
                binary: Some(format!("{:#b}", bits)),
            }
        }
        None => FormattedResult {
            decimal: repr(value),
            hex: None,
            binary: None,
        },
    }
}

/// All three outputs are suppressed on failure.
pub fn format_outcome(outcome: &Result<f64, EvalError>) -> Option<FormattedResult> {
    outcome.as_ref().ok().map(|value| format_value(*value))
}

pub fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// The integer's two's-complement bit pattern, truncated to 64 bits.
fn low_64_bits(integer: &BigInt) -> u64 {
    let magnitude = integer.magnitude().iter_u64_digits().next().unwrap_or(0);
    match integer.sign() {
        Sign::Minus => magnitude.wrapping_neg(),
        _ => magnitude,
    }
}

/// Shortest round-trip text for a float, switching to exponent notation
/// below 1e-4 and from 1e16 upwards (`1e-05`, `1.5e+16`).
pub fn repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        plain + ".0"
    }
}
