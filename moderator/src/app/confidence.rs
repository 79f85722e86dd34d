//! Confidence normalization
//!
//! Providers report confidence as a 0-1 fraction, a 0-100 percentage, a
//! numeric string, or not at all. Everything is mapped onto the canonical
//! 0.0-1.0 scale here; missing or non-numeric confidence is 0.0 so it can
//! never authorize an action.

use serde::Deserialize;

use crate::domain::entities::{Confidence, RawValue};

/// How raw confidence values should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceScale {
    /// Values <= 1.0 are fractions, larger values are percentages
    #[default]
    Auto,
    /// Always a 0-1 fraction
    Unit,
    /// Always a 0-100 percentage
    Percent,
}

impl std::fmt::Display for ConfidenceScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceScale::Auto => write!(f, "auto"),
            ConfidenceScale::Unit => write!(f, "unit"),
            ConfidenceScale::Percent => write!(f, "percent"),
        }
    }
}

impl std::str::FromStr for ConfidenceScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ConfidenceScale::Auto),
            "unit" | "fraction" => Ok(ConfidenceScale::Unit),
            "percent" | "percentage" => Ok(ConfidenceScale::Percent),
            _ => Err(format!("Unknown confidence scale: {}", s)),
        }
    }
}

/// Map a raw confidence value onto [0, 1]
pub fn normalize_confidence(raw: Option<&RawValue>, scale: ConfidenceScale) -> Confidence {
    let Some(value) = raw.and_then(RawValue::as_f64) else {
        return Confidence::ZERO;
    };

    let fraction = match scale {
        ConfidenceScale::Auto if value <= 1.0 => value,
        ConfidenceScale::Auto => value / 100.0,
        ConfidenceScale::Unit => value,
        ConfidenceScale::Percent => value / 100.0,
    };

    Confidence::new(fraction)
}
