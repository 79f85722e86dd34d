//! Reddit adapter
//!
//! Implementation of the content platform port against the Reddit OAuth API.

pub mod client;

pub use client::RedditClient;
