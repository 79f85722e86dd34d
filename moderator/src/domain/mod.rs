//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: rules, queued items, verdicts and decisions
//! - `ports`: Trait definitions for external dependencies (LLM, content platform)

pub mod entities;
pub mod ports;
