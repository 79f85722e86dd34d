//! Modqueue moderator
//!
//! LLM-assisted moderation for a subreddit's moderation queue. Each queued
//! item is judged against the subreddit's rules by a language model, and the
//! verdict is turned into exactly one action (approve, remove, or nothing)
//! by a confidence-gated policy. The model and the platform sit behind the
//! port traits in `domain::ports`, with concrete clients under `adapters`.

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;

#[cfg(test)]
mod test_utils;
