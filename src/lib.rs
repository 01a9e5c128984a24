//! Mailroute - hybrid AI model router for email analysis
//!
//! This library decides, per email, which language-model tier to invoke based on
//! a lexical complexity score, executes the call against the bound provider, and
//! falls back across providers and tiers on failure.

pub mod complexity;
pub mod config;
pub mod engine;
pub mod error;
pub mod providers;
pub mod request_id;
pub mod router;
pub mod telemetry;
