//! Unit normalization to the canonical dashboard unit (kWh).

use crate::error::NormalizeError;
use crate::model::Commodity;

/// Fixed conversion factor: 1 therm = 29.3001 kWh.
pub const KWH_PER_THERM: f64 = 29.3001;

/// A consumption figure in the canonical unit, with the vendor's original
/// figure retained when a conversion happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub consumption_kwh: f64,
    pub native_value: Option<f64>,
    pub native_unit: Option<String>,
}

/// Converts a native consumption figure to kWh.
///
/// Electricity already arrives in kWh and passes through unchanged. Gas in
/// therms is converted, preserving the original figure. Any other unit is
/// unrecoverable for that reading: omitted, never approximated.
pub fn normalize(
    commodity: Commodity,
    native_value: f64,
    native_unit: &str,
) -> Result<Normalized, NormalizeError> {
    match native_unit.trim().to_lowercase().as_str() {
        "kwh" => Ok(Normalized {
            consumption_kwh: native_value,
            native_value: None,
            native_unit: None,
        }),
        "therm" | "therms" => Ok(Normalized {
            consumption_kwh: native_value * KWH_PER_THERM,
            native_value: Some(native_value),
            native_unit: Some("therm".to_string()),
        }),
        other => Err(NormalizeError::unsupported(commodity, other)),
    }
}
