//! Domain layer for the PowerGuard backend.
//!
//! This crate contains the Optimization Strategy Engine:
//! - Domain models (DeviceSnapshot, Strategy, Actionable, Insight, AnalysisResult)
//! - Immutable strategy and app-catalog tables
//! - The pipeline stages and the `OptimizationEngine` entry point
//! - Collaborator traits for the pattern store and the external classifier

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::AnalysisError;
