//! Repository implementations.

pub mod usage_pattern;

pub use usage_pattern::UsagePatternRepository;
