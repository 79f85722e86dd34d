//! Domain entities
//!
//! Pure domain models for rules, queued items, model verdicts and decisions.

pub mod decision;
pub mod item;
pub mod rule;
pub mod verdict;

pub use decision::{Decision, DecisionRecord, ModerationAction, RunSummary, SideEffects};
pub use item::{truncate_chars, ItemType, ItemTypeFilter, ModerationItem};
pub use rule::{NotificationMethod, RuleDefinition, RuleKey, RuleSet};
pub use verdict::{Confidence, RawValue, Verdict, NO_EXPLANATION, PARSE_FAILURE_MARKER};
