//! Integration tests module
//!
//! Exercises the dispatcher and the build notifier against a mock Howtank API.

#[path = "../common/mod.rs"]
mod common;
