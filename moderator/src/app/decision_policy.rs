//! Decision policy
//!
//! Combines a verdict, its normalized confidence and the resolved rule into
//! exactly one action. Approving and removing each have their own inclusive
//! threshold; low confidence never approves or removes, and removal always
//! requires a configured rule.

use crate::domain::entities::{Confidence, Decision, NotificationMethod, RuleDefinition, Verdict};
use crate::error::ConfigError;

/// Default threshold for both approve and remove
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Threshold configuration for the decision table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    approve_threshold: f64,
    remove_threshold: f64,
    /// Replaces the rule's notification method on removals when set
    channel_override: Option<NotificationMethod>,
}

impl DecisionPolicy {
    /// Both thresholds must lie in [0, 1], the canonical confidence scale.
    pub fn new(approve_threshold: f64, remove_threshold: f64) -> Result<Self, ConfigError> {
        validate_threshold("approve_threshold", approve_threshold)?;
        validate_threshold("remove_threshold", remove_threshold)?;
        Ok(Self {
            approve_threshold,
            remove_threshold,
            channel_override: None,
        })
    }

    pub fn with_channel_override(mut self, channel: Option<NotificationMethod>) -> Self {
        self.channel_override = channel;
        self
    }

    pub fn approve_threshold(&self) -> f64 {
        self.approve_threshold
    }

    pub fn remove_threshold(&self) -> f64 {
        self.remove_threshold
    }

    pub fn channel_override(&self) -> Option<NotificationMethod> {
        self.channel_override
    }

    /// Decide what to do with an item. Pure: identical inputs give identical decisions.
    pub fn decide(
        &self,
        verdict: &Verdict,
        confidence: Confidence,
        matched_rule: Option<&RuleDefinition>,
    ) -> Decision {
        let confidence = confidence.value();

        // Missing or zero confidence never authorizes an action, whatever the thresholds
        if verdict.confidence_raw.is_none() || confidence <= 0.0 {
            return Decision::no_action(format!(
                "No usable confidence ({:.2}) in model verdict",
                confidence
            ));
        }

        if !verdict.violates {
            if confidence >= self.approve_threshold {
                return Decision::approve(format!(
                    "No violation (confidence {:.2})",
                    confidence
                ));
            }
            return Decision::no_action(format!(
                "Confidence {:.2} below approve threshold {:.2}",
                confidence, self.approve_threshold
            ));
        }

        let Some(rule) = matched_rule else {
            let reported = verdict
                .rule_number
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "none".to_string());
            return Decision::no_action(format!("Rule {} not found", reported));
        };

        if confidence < self.remove_threshold {
            return Decision::no_action(format!(
                "Confidence {:.2} below remove threshold {:.2} for rule {}",
                confidence, self.remove_threshold, rule.number
            ));
        }

        let channel = self.channel_override.unwrap_or(rule.notification_method);
        Decision::remove(
            rule.clone(),
            channel,
            format!("{} (confidence {:.2})", rule, confidence),
        )
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            approve_threshold: DEFAULT_THRESHOLD,
            remove_threshold: DEFAULT_THRESHOLD,
            channel_override: None,
        }
    }
}

fn validate_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}
