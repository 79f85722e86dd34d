//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Manual mocks instead of mockall: the port traits take `&str` and
//! borrowed items, and hand-written mocks let tests script responses and
//! inspect recorded calls directly.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
