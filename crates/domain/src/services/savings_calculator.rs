//! Savings estimation.
//!
//! Figures are drawn from the per-tier ranges through an injected sampler,
//! then scaled down for every protected app.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::StrategyConfig;
use crate::models::{EstimatedSavings, Strategy};

/// Source of savings samples.
pub trait SavingsSampler: Send {
    /// Draw a value in `min..=max`.
    fn sample(&mut self, min: u32, max: u32) -> u32;
}

/// Uniform sampler over a seedable generator.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SavingsSampler for RandomSampler {
    fn sample(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Deterministic sampler returning the range midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSampler;

impl SavingsSampler for MidpointSampler {
    fn sample(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        min + (max - min) / 2
    }
}

/// Factor applied for `protected` apps: `max(floor, 1 - step * protected)`.
pub fn protection_factor(protected: usize, config: &StrategyConfig) -> f64 {
    (1.0 - config.protected_app_step * protected as f64).max(config.protected_app_floor)
}

/// Estimate savings for a strategy. Only surfaced resources are non-zero.
///
/// `protected_apps` counts the protected apps actually installed.
pub fn calculate(
    strategy: &Strategy,
    protected_apps: usize,
    config: &StrategyConfig,
    sampler: &mut dyn SavingsSampler,
) -> EstimatedSavings {
    let factor = protection_factor(protected_apps, config);
    let tier = strategy.aggressiveness;

    let battery_minutes = if strategy.show_battery_savings {
        let range = config.battery_savings.get(tier);
        (sampler.sample(range.min, range.max) as f64 * factor) as u32
    } else {
        0
    };

    let data_mb = if strategy.show_data_savings {
        let range = config.data_savings.get(tier);
        (sampler.sample(range.min, range.max) as f64 * factor) as u32
    } else {
        0
    };

    tracing::debug!(
        aggressiveness = %tier,
        factor,
        battery_minutes,
        data_mb,
        "Calculated savings"
    );

    EstimatedSavings {
        battery_minutes,
        data_mb,
    }
}
