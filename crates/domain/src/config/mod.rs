//! Immutable configuration tables for the strategy engine.
//!
//! Both tables are built once at startup and shared by reference; nothing in
//! the pipeline mutates them.

pub mod app_catalog;
pub mod strategy;

pub use app_catalog::AppCatalog;
pub use strategy::{
    BalancerThresholds, BatteryThresholds, DrainRates, SavingsRange, StrategyConfig,
    StrategyConfigError, TierTable, TimeThresholds,
};
