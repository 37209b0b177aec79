//! Persistence layer for the PowerGuard backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL usage-pattern store
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use repositories::UsagePatternRepository;
