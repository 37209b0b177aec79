//! Strategy thresholds, savings ranges and drain rates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Activity, Aggressiveness};

/// Inclusive numeric range a savings figure is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsRange {
    pub min: u32,
    pub max: u32,
}

impl SavingsRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// One value per aggressiveness tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub minimal: T,
    pub moderate: T,
    pub aggressive: T,
    pub very_aggressive: T,
}

impl<T: Copy> TierTable<T> {
    pub fn get(&self, tier: Aggressiveness) -> T {
        match tier {
            Aggressiveness::Minimal => self.minimal,
            Aggressiveness::Moderate => self.moderate,
            Aggressiveness::Aggressive => self.aggressive,
            Aggressiveness::VeryAggressive => self.very_aggressive,
        }
    }

    fn values(&self) -> [T; 4] {
        [
            self.minimal,
            self.moderate,
            self.aggressive,
            self.very_aggressive,
        ]
    }
}

/// Battery-level cutoffs (inclusive upper bounds) for initial aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryThresholds {
    pub very_aggressive: f64,
    pub aggressive: f64,
    pub moderate: f64,
}

/// Time-budget cutoffs in minutes (inclusive upper bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeThresholds {
    pub very_aggressive_minutes: u32,
    pub aggressive_minutes: u32,
    pub moderate_minutes: u32,
}

/// Device-state cutoffs used by the priority balancer.
///
/// Battery values are percent; data values are the remaining fraction of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancerThresholds {
    pub critical_battery: f64,
    pub critical_data_fraction: f64,
    pub low_battery: f64,
    pub high_battery: f64,
    pub low_data_fraction: f64,
    pub high_data_fraction: f64,
    pub safety_net_battery: f64,
    pub safety_net_data_fraction: f64,
}

/// Battery drain per activity, in percent per hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrainRates {
    pub youtube: f64,
    pub netflix: f64,
    pub video: f64,
    pub gaming: f64,
    pub navigation: f64,
    pub calls: f64,
    pub browsing: f64,
    pub messaging: f64,
    pub general: f64,
}

impl DrainRates {
    pub fn rate_for(&self, activity: Activity) -> f64 {
        match activity {
            Activity::YouTube => self.youtube,
            Activity::Netflix => self.netflix,
            Activity::VideoStreaming => self.video,
            Activity::Gaming => self.gaming,
            Activity::Navigation => self.navigation,
            Activity::Calls => self.calls,
            Activity::Browsing => self.browsing,
            Activity::Messaging => self.messaging,
            Activity::General => self.general,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StrategyConfigError {
    #[error("Invalid savings range for {0}: min exceeds max")]
    InvertedRange(&'static str),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// All tunables of the strategy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub battery_thresholds: BatteryThresholds,
    pub time_thresholds: TimeThresholds,
    pub balancer: BalancerThresholds,
    /// Minutes of battery life gained per tier
    pub battery_savings: TierTable<SavingsRange>,
    /// Megabytes of data saved per tier
    pub data_savings: TierTable<SavingsRange>,
    /// Savings reduction per protected app
    pub protected_app_step: f64,
    /// Lower bound on the protected-app scaling factor
    pub protected_app_floor: f64,
    /// Plan size assumed when the device does not report one (MB)
    pub default_data_plan_mb: f64,
    /// Battery level at or below which the battery saver is recommended
    pub battery_saver_level: f64,
    /// Battery level at or below which a high-severity warning is raised
    pub critical_battery_warning: f64,
    /// Battery level at or below which a medium-severity warning is raised
    pub low_battery_warning: f64,
    pub drain_rates: DrainRates,
    /// Required headroom for an unconditional "yes" (0.2 = 20%)
    pub feasibility_margin: f64,
    pub default_top_apps: usize,
    pub max_top_apps: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            battery_thresholds: BatteryThresholds {
                very_aggressive: 10.0,
                aggressive: 30.0,
                moderate: 50.0,
            },
            time_thresholds: TimeThresholds {
                very_aggressive_minutes: 60,
                aggressive_minutes: 180,
                moderate_minutes: 360,
            },
            balancer: BalancerThresholds {
                critical_battery: 10.0,
                critical_data_fraction: 0.10,
                low_battery: 30.0,
                high_battery: 70.0,
                low_data_fraction: 0.30,
                high_data_fraction: 0.70,
                safety_net_battery: 15.0,
                safety_net_data_fraction: 0.15,
            },
            battery_savings: TierTable {
                minimal: SavingsRange::new(2, 8),
                moderate: SavingsRange::new(5, 15),
                aggressive: SavingsRange::new(10, 20),
                very_aggressive: SavingsRange::new(15, 25),
            },
            data_savings: TierTable {
                minimal: SavingsRange::new(5, 30),
                moderate: SavingsRange::new(30, 80),
                aggressive: SavingsRange::new(80, 150),
                very_aggressive: SavingsRange::new(150, 250),
            },
            protected_app_step: 0.1,
            protected_app_floor: 0.5,
            default_data_plan_mb: 2000.0,
            battery_saver_level: 30.0,
            critical_battery_warning: 10.0,
            low_battery_warning: 30.0,
            drain_rates: DrainRates {
                youtube: 25.0,
                netflix: 20.0,
                video: 20.0,
                gaming: 25.0,
                navigation: 18.0,
                calls: 15.0,
                browsing: 12.0,
                messaging: 10.0,
                general: 10.0,
            },
            feasibility_margin: 0.20,
            default_top_apps: 3,
            max_top_apps: 10,
        }
    }
}

impl StrategyConfig {
    /// Override the assumed data plan size.
    pub fn with_default_data_plan(mut self, plan_mb: f64) -> Self {
        self.default_data_plan_mb = plan_mb;
        self
    }

    /// Check internal consistency of the tables.
    pub fn validate(&self) -> Result<(), StrategyConfigError> {
        for range in self.battery_savings.values() {
            if range.min > range.max {
                return Err(StrategyConfigError::InvertedRange("battery savings"));
            }
        }
        for range in self.data_savings.values() {
            if range.min > range.max {
                return Err(StrategyConfigError::InvertedRange("data savings"));
            }
        }

        let b = &self.battery_thresholds;
        if !(b.very_aggressive <= b.aggressive && b.aggressive <= b.moderate) {
            return Err(StrategyConfigError::InvalidThreshold(
                "battery thresholds must be ascending".into(),
            ));
        }

        let t = &self.time_thresholds;
        if !(t.very_aggressive_minutes <= t.aggressive_minutes
            && t.aggressive_minutes <= t.moderate_minutes)
        {
            return Err(StrategyConfigError::InvalidThreshold(
                "time thresholds must be ascending".into(),
            ));
        }

        if self.default_data_plan_mb <= 0.0 {
            return Err(StrategyConfigError::InvalidThreshold(
                "default data plan must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.protected_app_floor) {
            return Err(StrategyConfigError::InvalidThreshold(
                "protected app floor must be within 0..=1".into(),
            ));
        }

        Ok(())
    }
}
