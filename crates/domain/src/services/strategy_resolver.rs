//! Initial strategy resolution.
//!
//! Combines the battery level with the classified prompt and its extracted
//! constraints. Resolution order:
//! 1. Aggressiveness from battery level
//! 2. Focus from the classification goals
//! 3. Protections merged in; a time budget replaces the battery-derived tier
//! 4. Savings visibility from the goals

use super::constraint_extractor::Constraints;
use crate::config::strategy::{BatteryThresholds, TimeThresholds};
use crate::config::StrategyConfig;
use crate::models::{Aggressiveness, Focus, PromptClassification, Strategy};

/// Input for strategy resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    /// Battery level, already defaulted and clamped
    pub battery_level: f64,
    pub classification: &'a PromptClassification,
    pub constraints: &'a Constraints,
}

/// Tier derived from the battery level alone.
pub fn aggressiveness_for_battery(level: f64, thresholds: &BatteryThresholds) -> Aggressiveness {
    if level <= thresholds.very_aggressive {
        Aggressiveness::VeryAggressive
    } else if level <= thresholds.aggressive {
        Aggressiveness::Aggressive
    } else if level <= thresholds.moderate {
        Aggressiveness::Moderate
    } else {
        Aggressiveness::Minimal
    }
}

/// Tier implied by a time budget, `None` when the budget is long enough to
/// leave the battery-derived tier alone.
pub fn aggressiveness_for_time(minutes: u32, thresholds: &TimeThresholds) -> Option<Aggressiveness> {
    if minutes <= thresholds.very_aggressive_minutes {
        Some(Aggressiveness::VeryAggressive)
    } else if minutes <= thresholds.aggressive_minutes {
        Some(Aggressiveness::Aggressive)
    } else if minutes <= thresholds.moderate_minutes {
        Some(Aggressiveness::Moderate)
    } else {
        None
    }
}

/// Resolve the initial strategy. Pure; the balancer refines the result.
pub fn resolve(input: &ResolverInput<'_>, config: &StrategyConfig) -> Strategy {
    let base = aggressiveness_for_battery(input.battery_level, &config.battery_thresholds);
    let classification = input.classification;

    if !classification.is_relevant {
        tracing::debug!(
            battery_level = input.battery_level,
            aggressiveness = %base,
            "Irrelevant prompt, using battery-derived defaults"
        );
        return Strategy::new(Focus::Both, base);
    }

    let focus = Focus::from_goals(classification.optimize_battery, classification.optimize_data);
    let mut strategy = Strategy::new(focus, base);

    strategy
        .protected_apps
        .extend(classification.protected_apps.iter().cloned());
    strategy
        .protected_apps
        .extend(input.constraints.protected_apps.iter().cloned());
    strategy
        .protected_categories
        .extend(input.constraints.critical_categories.iter().copied());

    strategy.time_constraint_minutes = classification
        .time_constraint_minutes
        .or_else(|| input.constraints.time_minutes());
    strategy.data_constraint_mb = input.constraints.data_mb;

    if let Some(minutes) = strategy.time_constraint_minutes {
        if let Some(tier) = aggressiveness_for_time(minutes, &config.time_thresholds) {
            strategy.aggressiveness = tier;
        }
    }

    strategy.show_battery_savings = classification.optimize_battery;
    strategy.show_data_savings = classification.optimize_data;

    tracing::debug!(
        focus = %strategy.focus,
        aggressiveness = %strategy.aggressiveness,
        protected = strategy.protected_apps.len(),
        time_constraint_minutes = ?strategy.time_constraint_minutes,
        "Resolved initial strategy"
    );

    strategy
}
