//! Shared utilities and common types for the PowerGuard backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Telemetry normalization (sentinel handling, lenient numeric decoding)
//! - Common validation logic

pub mod telemetry;
pub mod validation;
