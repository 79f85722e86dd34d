//! Response parser for model verdicts
//!
//! Turns raw model text into a `Verdict`. Models wrap JSON in prose or code
//! fences, quote booleans and mix number types, so decoding is lenient about
//! shape but strict about the one field that matters: `violates`.
//!
//! Never fails: output that cannot be decoded becomes
//! [`Verdict::parse_failure`], which can never authorize an action.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::{truncate_chars, RawValue, Verdict, NO_EXPLANATION};

/// Outermost brace-delimited span (greedy, across newlines)
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON span pattern is valid"));

/// Why one decoding attempt was rejected
#[derive(Debug, Error)]
enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("top-level value is not an object")]
    NotAnObject,

    #[error("missing 'violates' field")]
    MissingViolates,

    #[error("'violates' is not a boolean: {0}")]
    InvalidViolates(String),
}

/// Parse raw model output into a verdict
pub fn parse_verdict(raw_text: &str) -> Verdict {
    let strict_error = match decode_object(raw_text) {
        Ok(verdict) => return verdict,
        Err(e) => e,
    };

    if let Some(span) = JSON_SPAN.find(raw_text) {
        match decode_object(span.as_str()) {
            Ok(verdict) => {
                tracing::debug!(
                    strict_error = %strict_error,
                    "Extracted verdict JSON from surrounding text"
                );
                return verdict;
            }
            Err(e) => {
                tracing::warn!(
                    strict_error = %strict_error,
                    extracted_error = %e,
                    preview = %truncate_chars(raw_text, 100),
                    "Could not parse model response"
                );
            }
        }
    } else {
        tracing::warn!(
            error = %strict_error,
            preview = %truncate_chars(raw_text, 100),
            "Model response contains no JSON object"
        );
    }

    Verdict::parse_failure()
}

fn decode_object(text: &str) -> Result<Verdict, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let violates = parse_violates(&fields)?;

    let rule_number = fields.get("rule_number").and_then(RawValue::from_json);
    let confidence_raw = fields.get("confidence").and_then(RawValue::from_json);

    let explanation = match fields.get("explanation") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => NO_EXPLANATION.to_string(),
        Some(other) => other.to_string(),
    };

    Ok(Verdict {
        violates,
        rule_number,
        explanation,
        confidence_raw,
    })
}

fn parse_violates(fields: &Map<String, Value>) -> Result<bool, DecodeError> {
    match fields.get("violates") {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(DecodeError::InvalidViolates(s.clone())),
        },
        Some(other) => Err(DecodeError::InvalidViolates(other.to_string())),
        None => Err(DecodeError::MissingViolates),
    }
}
