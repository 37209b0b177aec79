//! Device-state overrides applied after initial resolution.
//!
//! User intent wins unless a resource is in crisis. The override table is
//! evaluated top to bottom and a later row may override an earlier one.

use super::constraint_extractor::Constraints;
use crate::config::strategy::BalancerThresholds;
use crate::config::StrategyConfig;
use crate::models::{Aggressiveness, DeviceSnapshot, Focus, Strategy};

/// Battery and data levels the balancer decides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceState {
    /// Percent, 0..=100
    pub battery_level: f64,
    /// Remaining share of the data plan, 0..=1
    pub data_remaining_fraction: f64,
}

impl ResourceState {
    pub fn new(battery_level: f64, data_remaining_fraction: f64) -> Self {
        Self {
            battery_level: battery_level.clamp(0.0, 100.0),
            data_remaining_fraction: data_remaining_fraction.clamp(0.0, 1.0),
        }
    }

    /// Derive the state from a snapshot.
    ///
    /// A data budget named in the prompt is taken as the remaining amount;
    /// otherwise remaining is plan size minus usage so far.
    pub fn from_snapshot(
        snapshot: &DeviceSnapshot,
        constraints: &Constraints,
        config: &StrategyConfig,
    ) -> Self {
        let plan_mb = snapshot
            .total_data_mb
            .filter(|total| *total > 0.0)
            .unwrap_or(config.default_data_plan_mb);

        let remaining_mb = match constraints.data_mb {
            Some(remaining) => remaining,
            None => plan_mb - snapshot.data_used_mb().unwrap_or(0.0),
        };

        let fraction = if plan_mb > 0.0 {
            remaining_mb / plan_mb
        } else {
            1.0
        };

        Self::new(snapshot.battery_level(), fraction)
    }
}

type OverrideFn = fn(&Strategy, &ResourceState, &BalancerThresholds) -> Option<Strategy>;

/// One named row of the override table.
struct BalanceRule {
    name: &'static str,
    apply: OverrideFn,
}

fn critical_battery(
    strategy: &Strategy,
    state: &ResourceState,
    t: &BalancerThresholds,
) -> Option<Strategy> {
    if state.battery_level > t.critical_battery {
        return None;
    }
    let focus = if state.data_remaining_fraction <= t.critical_data_fraction {
        Focus::Both
    } else {
        Focus::Battery
    };
    Some(
        strategy
            .clone()
            .force_focus(focus)
            .with_aggressiveness(Aggressiveness::VeryAggressive),
    )
}

fn critical_data(
    strategy: &Strategy,
    state: &ResourceState,
    t: &BalancerThresholds,
) -> Option<Strategy> {
    if state.data_remaining_fraction > t.critical_data_fraction {
        return None;
    }
    let focus = if state.battery_level <= t.low_battery {
        Focus::Both
    } else {
        Focus::Data
    };
    Some(
        strategy
            .clone()
            .force_focus(focus)
            .with_aggressiveness(Aggressiveness::VeryAggressive),
    )
}

fn high_battery_low_data(
    strategy: &Strategy,
    state: &ResourceState,
    t: &BalancerThresholds,
) -> Option<Strategy> {
    (state.battery_level >= t.high_battery && state.data_remaining_fraction <= t.low_data_fraction)
        .then(|| strategy.clone().refocus(Focus::Data))
}

fn low_battery_high_data(
    strategy: &Strategy,
    state: &ResourceState,
    t: &BalancerThresholds,
) -> Option<Strategy> {
    (state.battery_level <= t.low_battery && state.data_remaining_fraction >= t.high_data_fraction)
        .then(|| strategy.clone().refocus(Focus::Battery))
}

fn safety_net(
    strategy: &Strategy,
    state: &ResourceState,
    t: &BalancerThresholds,
) -> Option<Strategy> {
    let add_battery =
        !strategy.focus.includes_battery() && state.battery_level <= t.safety_net_battery;
    let add_data =
        !strategy.focus.includes_data() && state.data_remaining_fraction <= t.safety_net_data_fraction;
    if !add_battery && !add_data {
        return None;
    }

    let mut focus = strategy.focus;
    if add_battery {
        focus = focus.with_battery();
    }
    if add_data {
        focus = focus.with_data();
    }
    Some(
        strategy
            .clone()
            .force_focus(focus)
            .raise_aggressiveness(Aggressiveness::Moderate),
    )
}

fn override_table() -> Vec<BalanceRule> {
    vec![
        BalanceRule {
            name: "critical_battery",
            apply: critical_battery,
        },
        BalanceRule {
            name: "critical_data",
            apply: critical_data,
        },
        BalanceRule {
            name: "high_battery_low_data",
            apply: high_battery_low_data,
        },
        BalanceRule {
            name: "low_battery_high_data",
            apply: low_battery_high_data,
        },
        BalanceRule {
            name: "safety_net",
            apply: safety_net,
        },
    ]
}

/// Apply the override table to a resolved strategy.
pub fn balance(strategy: Strategy, state: &ResourceState, config: &StrategyConfig) -> Strategy {
    override_table()
        .into_iter()
        .fold(strategy, |current, rule| {
            match (rule.apply)(&current, state, &config.balancer) {
                Some(next) => {
                    tracing::debug!(
                        rule = rule.name,
                        battery_level = state.battery_level,
                        data_remaining = state.data_remaining_fraction,
                        focus = %next.focus,
                        aggressiveness = %next.aggressiveness,
                        "Balancer override applied"
                    );
                    next
                }
                None => current,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(focus: Focus, aggressiveness: Aggressiveness) -> Strategy {
        let mut s = Strategy::new(focus, aggressiveness);
        s.show_battery_savings = focus.includes_battery();
        s.show_data_savings = focus.includes_data();
        s
    }

    fn run(s: Strategy, battery: f64, data: f64) -> Strategy {
        balance(s, &ResourceState::new(battery, data), &StrategyConfig::default())
    }

    #[test]
    fn test_critical_battery_overrides_data_request() {
        let s = run(strategy(Focus::Data, Aggressiveness::Minimal), 10.0, 0.9);
        assert_eq!(s.focus, Focus::Battery);
        assert_eq!(s.aggressiveness, Aggressiveness::VeryAggressive);
        assert!(s.show_battery_savings);
        assert!(!s.show_data_savings);
    }

    #[test]
    fn test_critical_battery_surfaces_savings_for_irrelevant_prompt() {
        let s = run(Strategy::new(Focus::Both, Aggressiveness::Minimal), 8.0, 0.9);
        assert_eq!(s.focus, Focus::Battery);
        assert!(s.show_battery_savings);
        assert!(!s.show_data_savings);
    }

    #[test]
    fn test_critical_battery_and_data() {
        let s = run(strategy(Focus::Battery, Aggressiveness::Minimal), 5.0, 0.05);
        assert_eq!(s.focus, Focus::Both);
        assert_eq!(s.aggressiveness, Aggressiveness::VeryAggressive);
    }

    #[test]
    fn test_critical_data_with_plenty_battery() {
        let s = run(strategy(Focus::Battery, Aggressiveness::Minimal), 60.0, 0.08);
        assert_eq!(s.focus, Focus::Data);
        assert_eq!(s.aggressiveness, Aggressiveness::VeryAggressive);
        assert!(s.show_data_savings);
    }

    #[test]
    fn test_critical_data_with_low_battery() {
        let s = run(strategy(Focus::Data, Aggressiveness::Minimal), 25.0, 0.08);
        assert_eq!(s.focus, Focus::Both);
    }

    #[test]
    fn test_high_battery_low_data_ignores_battery_request() {
        let s = run(strategy(Focus::Battery, Aggressiveness::Minimal), 85.0, 0.25);
        assert_eq!(s.focus, Focus::Data);
        assert_eq!(s.aggressiveness, Aggressiveness::Minimal);
        assert!(!s.show_battery_savings);
        assert!(s.show_data_savings);
    }

    #[test]
    fn test_low_battery_high_data() {
        let s = run(strategy(Focus::Data, Aggressiveness::Aggressive), 25.0, 0.9);
        assert_eq!(s.focus, Focus::Battery);
    }

    #[test]
    fn test_safety_net_adds_resource_and_only_raises() {
        // Data at 12% is not critical for the ordered rules but trips the net.
        let s = run(strategy(Focus::Battery, Aggressiveness::Minimal), 50.0, 0.12);
        assert_eq!(s.focus, Focus::Both);
        assert_eq!(s.aggressiveness, Aggressiveness::Moderate);

        let s = run(strategy(Focus::Battery, Aggressiveness::Aggressive), 50.0, 0.12);
        assert_eq!(s.aggressiveness, Aggressiveness::Aggressive);
    }

    #[test]
    fn test_safety_net_battery() {
        let s = run(strategy(Focus::Data, Aggressiveness::Minimal), 14.0, 0.5);
        assert_eq!(s.focus, Focus::Both);
        assert_eq!(s.aggressiveness, Aggressiveness::Moderate);
    }

    #[test]
    fn test_no_override_in_normal_state() {
        let original = strategy(Focus::Battery, Aggressiveness::Moderate);
        let s = run(original.clone(), 50.0, 0.5);
        assert_eq!(s, original);
    }

    #[test]
    fn test_resource_state_from_snapshot() {
        let config = StrategyConfig::default();
        let mut snapshot = DeviceSnapshot::default();
        snapshot.battery.level = Some(85.0);
        snapshot.current_data_mb = Some(1500.0);
        let state = ResourceState::from_snapshot(&snapshot, &Constraints::default(), &config);
        assert_eq!(state.battery_level, 85.0);
        assert!((state.data_remaining_fraction - 0.25).abs() < 1e-9);

        snapshot.total_data_mb = Some(1000.0);
        let state = ResourceState::from_snapshot(&snapshot, &Constraints::default(), &config);
        assert_eq!(state.data_remaining_fraction, 0.0);
    }

    #[test]
    fn test_resource_state_prompt_budget() {
        let config = StrategyConfig::default();
        let snapshot = DeviceSnapshot::default();
        let constraints = Constraints {
            data_mb: Some(100.0),
            ..Default::default()
        };
        let state = ResourceState::from_snapshot(&snapshot, &constraints, &config);
        assert_eq!(state.battery_level, 50.0);
        assert!((state.data_remaining_fraction - 0.05).abs() < 1e-9);
    }
}
