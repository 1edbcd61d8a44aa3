//! Core domain + application logic for the assistant Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the OpenAI
//! Assistants backend live behind ports (traits) implemented in adapter
//! crates.

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod typing;

pub use errors::{Error, Result};
