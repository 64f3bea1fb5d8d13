//! Howtank Notifier Library
//!
//! Decides whether a finished build should be announced on a Howtank stream,
//! renders the message and posts it to the Howtank API.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
