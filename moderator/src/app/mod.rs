//! Application layer
//!
//! The moderation pipeline: parse model output, normalize confidence,
//! resolve the reported rule, decide, and orchestrate a queue run.
//! Services depend only on domain ports.

pub mod confidence;
pub mod decision_policy;
pub mod moderation_service;
pub mod prompt;
pub mod response_parser;
pub mod rule_resolver;

pub use confidence::{normalize_confidence, ConfidenceScale};
pub use decision_policy::{DecisionPolicy, DEFAULT_THRESHOLD};
pub use moderation_service::{Evaluation, ModerationService, ModerationSettings};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response_parser::parse_verdict;
pub use rule_resolver::resolve_rule;
