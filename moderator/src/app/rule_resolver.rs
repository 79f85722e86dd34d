//! Rule resolution
//!
//! Maps the rule number a model reported (int, float or string) to a
//! configured rule. A miss is not an error: the decision policy treats it as
//! "no rule matched", so a hallucinated rule number can never cause a removal.

use crate::domain::entities::{RawValue, RuleDefinition, RuleKey, RuleSet};

/// Resolve a reported rule number against the rule set
pub fn resolve_rule<'a>(
    rule_number: Option<&RawValue>,
    rules: &'a RuleSet,
) -> Option<&'a RuleDefinition> {
    let raw = rule_number?;

    if let Some(rule) = canonical_key(raw).and_then(|key| rules.get(&key)) {
        return Some(rule);
    }

    let fallback = integer_key(raw)?;
    let rule = rules.get(&fallback);
    if rule.is_none() {
        tracing::debug!(rule_number = %raw, "Reported rule number matches no configured rule");
    }
    rule
}

/// String form with non-essential formatting removed: surrounding
/// whitespace, and an all-zero fractional part (`"2.0"` -> `"2"`).
fn canonical_key(raw: &RawValue) -> Option<RuleKey> {
    match raw {
        RawValue::Number(n) => {
            let text = match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            };
            Some(strip_zero_fraction(&text))
        }
        RawValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| strip_zero_fraction(trimmed))
        }
    }
}

fn strip_zero_fraction(text: &str) -> RuleKey {
    match text.split_once('.') {
        Some((whole, fraction))
            if !whole.is_empty() && !fraction.is_empty() && fraction.chars().all(|c| c == '0') =>
        {
            RuleKey::new(whole)
        }
        _ => RuleKey::new(text),
    }
}

/// Integer interpretation of the value (`"03"` -> `"3"`, `1.0` -> `"1"`)
fn integer_key(raw: &RawValue) -> Option<RuleKey> {
    match raw {
        RawValue::Number(n) => match n.as_i64() {
            Some(i) => Some(RuleKey::from_int(i)),
            None => n.as_f64().and_then(RuleKey::from_float),
        },
        RawValue::Text(s) => RuleKey::parse_integer(s),
    }
}
