//! Verdict entity
//!
//! The model's structured judgment about one item, as parsed from its raw
//! output. Boundary values (rule number, confidence) are kept in their raw
//! representation until the resolver and normalizer canonicalize them.

use serde::Serialize;

/// Explanation carried by the verdict produced when model output cannot be
/// decoded at all.
pub const PARSE_FAILURE_MARKER: &str = "[unparseable model response]";

/// Explanation used when the model did not give one
pub const NO_EXPLANATION: &str = "No explanation provided";

/// A loosely-typed scalar as received from the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// JSON number, preserving the integer/float distinction
    Number(serde_json::Number),
    /// JSON string, unconverted
    Text(String),
}

impl RawValue {
    /// Capture numbers and strings; every other JSON type is treated as absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(RawValue::Number(n.clone())),
            serde_json::Value::String(s) => Some(RawValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric reading of the value, if it has one.
    ///
    /// Strings are accepted when they hold a finite number (`"0.9"`, `" 85 "`).
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => n.as_f64()?,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.into())
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Parsed model output for a single item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub violates: bool,
    pub rule_number: Option<RawValue>,
    pub explanation: String,
    pub confidence_raw: Option<RawValue>,
}

impl Verdict {
    /// The verdict used when nothing usable could be decoded: no violation,
    /// no rule, no confidence. It can never authorize an action.
    pub fn parse_failure() -> Self {
        Self {
            violates: false,
            rule_number: None,
            explanation: PARSE_FAILURE_MARKER.to_string(),
            confidence_raw: None,
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        self.explanation == PARSE_FAILURE_MARKER
            && !self.violates
            && self.rule_number.is_none()
            && self.confidence_raw.is_none()
    }
}

/// Model confidence on the canonical 0.0-1.0 scale
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    /// Clamp into [0, 1]; NaN becomes zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
