//! Rule domain entity
//!
//! Subreddit rules as configured by moderators, and the immutable rule set
//! every decision is made against.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Canonical rule number: the decimal string form of the rule's integer.
///
/// Rules files and model output both report numbers as ints, floats or
/// strings; all of them are folded into this key before lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleKey(String);

impl RuleKey {
    /// Wrap an already-formatted key. No normalization is applied.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_int(number: i64) -> Self {
        Self(number.to_string())
    }

    /// Interpret text as an integer rule number.
    ///
    /// Accepts surrounding whitespace, a leading `+`, leading zeros and an
    /// all-zero fractional part (`"3"`, `" 03 "`, `"3.0"`). Anything else is
    /// not an integer and yields `None`.
    pub fn parse_integer(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(Self::from_int(n));
        }
        let f = text.parse::<f64>().ok()?;
        Self::from_float(f)
    }

    /// Integer-valued floats map to their integer key (`1.0` -> `"1"`).
    pub fn from_float(value: f64) -> Option<Self> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Some(Self::from_int(value as i64))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a user is told about a removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    /// Public removal comment (submissions) or reply (comments)
    #[default]
    Public,
    /// Private message sent from the subreddit
    Modmail,
}

impl std::fmt::Display for NotificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationMethod::Public => write!(f, "public"),
            NotificationMethod::Modmail => write!(f, "modmail"),
        }
    }
}

impl std::str::FromStr for NotificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(NotificationMethod::Public),
            "modmail" => Ok(NotificationMethod::Modmail),
            _ => Err(format!("Unknown notification method: {}", s)),
        }
    }
}

/// A single subreddit rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDefinition {
    pub number: RuleKey,
    pub title: String,
    pub explanation: String,
    /// Text sent to the author when content is removed under this rule
    pub response_text: String,
    pub notification_method: NotificationMethod,
}

impl std::fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule {}: {}", self.number, self.title)
    }
}

/// Ordered, immutable collection of rules with lookup by canonical number
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RuleDefinition>,
    by_number: HashMap<RuleKey, usize>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate numbers and empty input.
    pub fn new(rules: Vec<RuleDefinition>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::EmptyRuleSet);
        }

        let mut by_number = HashMap::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if by_number.insert(rule.number.clone(), index).is_some() {
                return Err(ConfigError::DuplicateRule(rule.number.to_string()));
            }
        }

        Ok(Self { rules, by_number })
    }

    /// Parse a rules document of the form `rules: [...]`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = serde_yaml::from_str(yaml)?;
        let rules = file
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_rule(index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// Load a rules file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rule_set = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), rules = rule_set.len(), "Loaded rules");
        Ok(rule_set)
    }

    pub fn get(&self, key: &RuleKey) -> Option<&RuleDefinition> {
        self.by_number.get(key).map(|&index| &self.rules[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

/// Rule as written in the rules file, before validation
#[derive(Deserialize)]
struct RawRule {
    number: Option<serde_yaml::Value>,
    title: Option<String>,
    explanation: Option<String>,
    #[serde(alias = "response_text")]
    response: Option<String>,
    notification_method: Option<String>,
}

impl RawRule {
    fn into_rule(self, index: usize) -> Result<RuleDefinition, ConfigError> {
        let position = format!("#{}", index + 1);
        let number = match self.number {
            Some(value) => rule_key_from_yaml(&value)?,
            None => {
                return Err(ConfigError::MissingField {
                    rule: position,
                    field: "number",
                })
            }
        };
        let label = number.to_string();

        let title = self.title.ok_or_else(|| ConfigError::MissingField {
            rule: label.clone(),
            field: "title",
        })?;
        let response_text = self.response.ok_or_else(|| ConfigError::MissingField {
            rule: label.clone(),
            field: "response",
        })?;

        let notification_method = match self.notification_method {
            Some(method) => method
                .parse()
                .map_err(|_| ConfigError::UnknownValue {
                    kind: "notification_method",
                    value: method,
                })?,
            None => NotificationMethod::default(),
        };

        Ok(RuleDefinition {
            number,
            title,
            explanation: self.explanation.unwrap_or_default(),
            response_text,
            notification_method,
        })
    }
}

fn rule_key_from_yaml(value: &serde_yaml::Value) -> Result<RuleKey, ConfigError> {
    let key = match value {
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(RuleKey::from_int(i)),
            None => n.as_f64().and_then(RuleKey::from_float),
        },
        serde_yaml::Value::String(s) => RuleKey::parse_integer(s),
        _ => None,
    };

    key.ok_or_else(|| {
        let shown = serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("{:?}", value));
        ConfigError::InvalidRuleNumber(shown)
    })
}
