//! Decision entities
//!
//! What the policy decided for an item, and the audit record of processing it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::item::ItemType;
use super::rule::{NotificationMethod, RuleDefinition};
use super::verdict::{Confidence, Verdict};

/// The action taken on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Remove,
    NoAction,
}

impl std::fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationAction::Approve => write!(f, "approve"),
            ModerationAction::Remove => write!(f, "remove"),
            ModerationAction::NoAction => write!(f, "no_action"),
        }
    }
}

/// Output of the decision policy for one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: ModerationAction,
    /// Present only for `Remove`
    pub matched_rule: Option<RuleDefinition>,
    /// Text sent to the author; empty unless removing
    pub message: String,
    /// Where `message` goes; `None` unless removing
    pub channel: Option<NotificationMethod>,
    /// Why this action was chosen (audit trail)
    pub reason: String,
}

impl Decision {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            action: ModerationAction::Approve,
            matched_rule: None,
            message: String::new(),
            channel: None,
            reason: reason.into(),
        }
    }

    pub fn remove(
        rule: RuleDefinition,
        channel: NotificationMethod,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action: ModerationAction::Remove,
            message: rule.response_text.clone(),
            matched_rule: Some(rule),
            channel: Some(channel),
            reason: reason.into(),
        }
    }

    pub fn no_action(reason: impl Into<String>) -> Self {
        Self {
            action: ModerationAction::NoAction,
            matched_rule: None,
            message: String::new(),
            channel: None,
            reason: reason.into(),
        }
    }

    /// One-line summary, e.g. "Removed (Rule 2)"
    pub fn summary(&self) -> String {
        match (self.action, &self.matched_rule) {
            (ModerationAction::Approve, _) => "Approved".to_string(),
            (ModerationAction::Remove, Some(rule)) => format!("Removed (Rule {})", rule.number),
            (ModerationAction::Remove, None) => "Removed".to_string(),
            (ModerationAction::NoAction, _) => format!("No action taken ({})", self.reason),
        }
    }
}

/// What happened to the decision's side effects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SideEffects {
    /// Action (and notification, for removals) went through
    Applied,
    /// Dry run: computed but not applied
    DryRun,
    /// `NoAction` needs no platform call
    NotRequired,
    /// A platform call failed; not retried
    Failed(String),
}

/// Audit record for one processed item
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub item_id: String,
    pub item_type: ItemType,
    /// `None` when the provider call failed before any output was produced
    pub verdict: Option<Verdict>,
    pub confidence: Confidence,
    pub decision: Decision,
    pub side_effects: SideEffects,
    pub decided_at: DateTime<Utc>,
}

/// Counters for one pass over the queue
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub processed: usize,
    pub approved: usize,
    pub removed: usize,
    pub no_action: usize,
    pub provider_failures: usize,
    pub side_effect_failures: usize,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dry_run,
            processed: 0,
            approved: 0,
            removed: 0,
            no_action: 0,
            provider_failures: 0,
            side_effect_failures: 0,
        }
    }

    /// Fold one record into the counters
    pub fn record(&mut self, record: &DecisionRecord) {
        self.processed += 1;
        match record.decision.action {
            ModerationAction::Approve => self.approved += 1,
            ModerationAction::Remove => self.removed += 1,
            ModerationAction::NoAction => self.no_action += 1,
        }
        if record.verdict.is_none() {
            self.provider_failures += 1;
        }
        if matches!(record.side_effects, SideEffects::Failed(_)) {
            self.side_effect_failures += 1;
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed {} item(s): {} approved, {} removed, {} no action ({} provider failure(s), {} failed side effect(s)){}",
            self.processed,
            self.approved,
            self.removed,
            self.no_action,
            self.provider_failures,
            self.side_effect_failures,
            if self.dry_run { " [dry run]" } else { "" }
        )
    }
}
