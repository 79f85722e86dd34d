//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use crate::domain::entities::{
    ItemType, ModerationItem, NotificationMethod, RawValue, RuleDefinition, RuleKey, RuleSet,
    Verdict,
};

/// Rules file used across tests: rule 1 (public), rule 2 (modmail), rule 3
pub const TEST_RULES_YAML: &str = r#"
rules:
  - number: 1
    title: No spam
    explanation: No self-promotion or link spam.
    response: Your post was removed for spam.
  - number: "2"
    title: Be civil
    explanation: No personal attacks or insults.
    response: Your comment was removed for incivility.
    notification_method: modmail
  - number: 3.0
    title: Stay on topic
    explanation: Posts must be about Rust.
    response_text: Your post was removed as off-topic.
"#;

/// Create a rule with the given number and default text
pub fn test_rule(number: i64) -> RuleDefinition {
    RuleDefinition {
        number: RuleKey::from_int(number),
        title: format!("Test rule {}", number),
        explanation: format!("Explanation for rule {}", number),
        response_text: format!("Removed under rule {}", number),
        notification_method: NotificationMethod::Public,
    }
}

/// Create the standard three-rule test rule set
pub fn test_rule_set() -> RuleSet {
    RuleSet::from_yaml_str(TEST_RULES_YAML).unwrap()
}

/// Create a verdict with an optional rule number and high confidence
pub fn test_verdict(violates: bool, rule_number: Option<RawValue>) -> Verdict {
    Verdict {
        violates,
        rule_number,
        explanation: "test explanation".to_string(),
        confidence_raw: Some(RawValue::from("0.9")),
    }
}

/// Create a queued link submission
pub fn test_submission() -> ModerationItem {
    ModerationItem {
        id: "s1".to_string(),
        fullname: "t3_s1".to_string(),
        item_type: ItemType::Submission,
        title: Some("Check out my crate".to_string()),
        body_text: "It parses things fast.".to_string(),
        author: Some("ferris".to_string()),
        subreddit: "rust".to_string(),
        url: Some("https://example.com/crate".to_string()),
        domain: Some("example.com".to_string()),
        link_title: None,
    }
}

/// Create a queued comment
pub fn test_comment() -> ModerationItem {
    ModerationItem {
        id: "c1".to_string(),
        fullname: "t1_c1".to_string(),
        item_type: ItemType::Comment,
        title: None,
        body_text: "This is a terrible take and you should feel bad.".to_string(),
        author: Some("crab".to_string()),
        subreddit: "rust".to_string(),
        url: None,
        domain: None,
        link_title: Some("Async closures are stable".to_string()),
    }
}
