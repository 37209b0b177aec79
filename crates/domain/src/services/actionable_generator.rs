//! Actionable generation from a frozen strategy.
//!
//! Apps are processed in snapshot order. A protected app yields exactly one
//! "keep normal" action and never a restrictive one.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

use crate::config::{AppCatalog, StrategyConfig};
use crate::models::{
    Actionable, ActionableType, AppUsageRecord, DeviceSnapshot, Strategy, TargetMode,
    SYSTEM_TARGET,
};

/// Build an id of the form `<prefix>-<target>-<8 hex chars>`.
fn actionable_id(prefix: &str, target: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, target, &suffix[..8])
}

fn system_action(
    actionable_type: ActionableType,
    description: &str,
    reason: String,
    new_mode: TargetMode,
    parameters: BTreeMap<String, String>,
) -> Actionable {
    Actionable {
        id: actionable_id("sys", SYSTEM_TARGET),
        actionable_type,
        package_name: SYSTEM_TARGET.to_string(),
        description: description.to_string(),
        reason,
        new_mode,
        parameters,
    }
}

fn global_actions(strategy: &Strategy, snapshot: &DeviceSnapshot, config: &StrategyConfig) -> Vec<Actionable> {
    let mut actions = Vec::new();
    let level = snapshot.battery_level();

    if strategy.focus.includes_battery() {
        if level <= config.battery_saver_level {
            actions.push(system_action(
                ActionableType::EnableBatterySaver,
                "Enable battery saver mode",
                format!("Battery level is low ({:.0}%)", level),
                TargetMode::Enabled,
                BTreeMap::new(),
            ));
        } else if snapshot.apps.iter().any(AppUsageRecord::has_battery_usage) {
            actions.push(system_action(
                ActionableType::ManageWakeLocks,
                "Limit wake locks held by background apps",
                "Apps are keeping the device awake".to_string(),
                TargetMode::Optimized,
                BTreeMap::new(),
            ));
        }

        if strategy.aggressiveness.is_aggressive() {
            actions.push(system_action(
                ActionableType::AdjustScreenSettings,
                "Lower screen brightness and shorten screen timeout",
                format!("Applying {} battery optimization", strategy.aggressiveness.label()),
                TargetMode::Dimmed,
                BTreeMap::from([
                    ("brightness".to_string(), "low".to_string()),
                    ("timeout".to_string(), "30s".to_string()),
                ]),
            ));
        }
    }

    if strategy.focus.includes_data() {
        let reason = match strategy.data_constraint_mb {
            Some(mb) => format!("Only {:.0} MB of data remaining", mb),
            None => "Reduce mobile data consumption".to_string(),
        };
        actions.push(system_action(
            ActionableType::EnableDataSaver,
            "Enable data saver mode",
            reason,
            TargetMode::Enabled,
            BTreeMap::new(),
        ));
    }

    actions
}

fn app_actions(
    app: &AppUsageRecord,
    name: &str,
    strategy: &Strategy,
    protected: bool,
) -> Vec<Actionable> {
    let package = app.package_name.as_str();

    if protected {
        return vec![Actionable {
            id: actionable_id("keep", package),
            actionable_type: ActionableType::SetStandbyBucket,
            package_name: package.to_string(),
            description: format!("Keep {} running normally", name),
            reason: format!("{} is protected for this session", name),
            new_mode: TargetMode::Normal,
            parameters: BTreeMap::from([("bucket".to_string(), "active".to_string())]),
        }];
    }

    let mut actions = Vec::new();
    let aggressive = strategy.aggressiveness.is_aggressive();

    if strategy.focus.includes_battery() && app.has_battery_usage() {
        let usage = app.battery_usage.unwrap_or_default();
        let (actionable_type, description, new_mode) = if aggressive {
            (
                ActionableType::RestrictBackground,
                format!("Restrict background activity for {}", name),
                TargetMode::Restricted,
            )
        } else {
            (
                ActionableType::OptimizeBattery,
                format!("Optimize battery usage for {}", name),
                TargetMode::Optimized,
            )
        };
        actions.push(Actionable {
            id: actionable_id("batt", package),
            actionable_type,
            package_name: package.to_string(),
            description,
            reason: format!("{} is using {:.1}% battery", name, usage),
            new_mode,
            parameters: BTreeMap::from([("batteryUsage".to_string(), format!("{:.1}", usage))]),
        });
    }

    if strategy.focus.includes_data() && app.has_data_usage() {
        let usage = app.data_usage_mb().unwrap_or_default();
        let (actionable_type, description, new_mode) = if aggressive {
            (
                ActionableType::RestrictBackgroundData,
                format!("Restrict background data for {}", name),
                TargetMode::Restricted,
            )
        } else {
            (
                ActionableType::AdjustSyncSettings,
                format!("Reduce sync frequency for {}", name),
                TargetMode::Reduced,
            )
        };
        actions.push(Actionable {
            id: actionable_id("data", package),
            actionable_type,
            package_name: package.to_string(),
            description,
            reason: format!("{} has used {:.1} MB of data", name, usage),
            new_mode,
            parameters: BTreeMap::from([("dataUsageMb".to_string(), format!("{:.1}", usage))]),
        });
    }

    actions
}

/// Installed packages the strategy protects, by name or by category.
pub fn installed_protected(
    strategy: &Strategy,
    snapshot: &DeviceSnapshot,
    catalog: &AppCatalog,
) -> BTreeSet<String> {
    snapshot
        .apps
        .iter()
        .filter(|app| strategy.protects(&app.package_name, catalog.category_of(&app.package_name)))
        .map(|app| app.package_name.clone())
        .collect()
}

/// Generate global and per-app actions for a strategy.
pub fn generate(
    strategy: &Strategy,
    snapshot: &DeviceSnapshot,
    catalog: &AppCatalog,
    config: &StrategyConfig,
) -> Vec<Actionable> {
    let mut actions = global_actions(strategy, snapshot, config);
    let mut seen = HashSet::new();

    for app in &snapshot.apps {
        if !seen.insert(app.package_name.as_str()) {
            continue;
        }
        let name = catalog
            .display_name(&app.package_name)
            .unwrap_or_else(|| app.label());
        let protected =
            strategy.protects(&app.package_name, catalog.category_of(&app.package_name));
        actions.extend(app_actions(app, name, strategy, protected));
    }

    tracing::debug!(
        count = actions.len(),
        focus = %strategy.focus,
        "Generated actionables"
    );

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Aggressiveness, AppCategory, DataUsage, Focus};
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    fn app(package: &str, battery: Option<f64>, data_mb: Option<f64>) -> AppUsageRecord {
        AppUsageRecord {
            package_name: package.to_string(),
            app_name: String::new(),
            battery_usage: battery,
            data_usage: data_mb.map(|mb| DataUsage {
                foreground: Some(mb),
                background: Some(0.0),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn snapshot(level: f64, apps: Vec<AppUsageRecord>) -> DeviceSnapshot {
        let mut s = DeviceSnapshot::default();
        s.battery.level = Some(level);
        s.apps = apps;
        s
    }

    fn run(strategy: &Strategy, snapshot: &DeviceSnapshot) -> Vec<Actionable> {
        generate(strategy, snapshot, &AppCatalog::default(), &StrategyConfig::default())
    }

    fn types_for<'a>(actions: &'a [Actionable], package: &str) -> Vec<ActionableType> {
        actions
            .iter()
            .filter(|a| a.package_name == package)
            .map(|a| a.actionable_type)
            .collect()
    }

    #[test]
    fn test_low_battery_enables_saver() {
        let s = Strategy::new(Focus::Battery, Aggressiveness::Moderate);
        let actions = run(&s, &snapshot(25.0, vec![app("com.example", Some(5.0), None)]));
        let system = types_for(&actions, SYSTEM_TARGET);
        assert_eq!(system, vec![ActionableType::EnableBatterySaver]);
    }

    #[test]
    fn test_wake_locks_when_battery_not_low() {
        let s = Strategy::new(Focus::Both, Aggressiveness::Moderate);
        let actions = run(&s, &snapshot(50.0, vec![app("com.example", Some(5.0), Some(10.0))]));
        let system = types_for(&actions, SYSTEM_TARGET);
        assert_eq!(
            system,
            vec![ActionableType::ManageWakeLocks, ActionableType::EnableDataSaver]
        );
    }

    #[test]
    fn test_aggressive_adds_screen_adjustment() {
        let s = Strategy::new(Focus::Battery, Aggressiveness::Aggressive);
        let actions = run(&s, &snapshot(20.0, vec![]));
        let screen = actions
            .iter()
            .find(|a| a.actionable_type == ActionableType::AdjustScreenSettings)
            .unwrap();
        assert_eq!(screen.new_mode, TargetMode::Dimmed);
        assert_eq!(screen.parameters.get("brightness").map(String::as_str), Some("low"));
        assert_eq!(screen.parameters.get("timeout").map(String::as_str), Some("30s"));
    }

    #[test]
    fn test_per_app_modes_follow_aggressiveness() {
        let apps = vec![app("com.example.heavy", Some(15.0), Some(120.0))];

        let s = Strategy::new(Focus::Both, Aggressiveness::Minimal);
        let actions = run(&s, &snapshot(80.0, apps.clone()));
        assert_eq!(
            types_for(&actions, "com.example.heavy"),
            vec![ActionableType::OptimizeBattery, ActionableType::AdjustSyncSettings]
        );

        let s = Strategy::new(Focus::Both, Aggressiveness::VeryAggressive);
        let actions = run(&s, &snapshot(80.0, apps));
        assert_eq!(
            types_for(&actions, "com.example.heavy"),
            vec![ActionableType::RestrictBackground, ActionableType::RestrictBackgroundData]
        );
    }

    #[test]
    fn test_focus_limits_per_app_actions() {
        let s = Strategy::new(Focus::Data, Aggressiveness::Aggressive);
        let actions = run(&s, &snapshot(80.0, vec![app("com.example", Some(15.0), Some(50.0))]));
        assert_eq!(
            types_for(&actions, "com.example"),
            vec![ActionableType::RestrictBackgroundData]
        );
        assert!(types_for(&actions, SYSTEM_TARGET).contains(&ActionableType::EnableDataSaver));
    }

    #[test]
    fn test_protected_app_gets_single_normal_action() {
        let mut s = Strategy::new(Focus::Both, Aggressiveness::VeryAggressive);
        s.protected_apps.insert("com.whatsapp".to_string());
        let actions = run(
            &s,
            &snapshot(5.0, vec![app("com.whatsapp", Some(30.0), Some(400.0))]),
        );
        let mine: Vec<&Actionable> = actions
            .iter()
            .filter(|a| a.package_name == "com.whatsapp")
            .collect();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].actionable_type, ActionableType::SetStandbyBucket);
        assert_eq!(mine[0].new_mode, TargetMode::Normal);
        assert!(mine[0].description.contains("WhatsApp"));
    }

    #[test]
    fn test_protection_invariant_random_apps() {
        for _ in 0..20 {
            let apps: Vec<AppUsageRecord> = (0..6)
                .map(|i| {
                    let word: String = Word().fake();
                    app(
                        &format!("com.{}.app{}", word, i),
                        Some((1..40).fake::<u32>() as f64),
                        Some((1..500).fake::<u32>() as f64),
                    )
                })
                .collect();
            let mut s = Strategy::new(Focus::Both, Aggressiveness::VeryAggressive);
            for a in apps.iter().step_by(2) {
                s.protected_apps.insert(a.package_name.clone());
            }

            let actions = run(&s, &snapshot(8.0, apps));
            for package in &s.protected_apps {
                let mine: Vec<&Actionable> =
                    actions.iter().filter(|a| &a.package_name == package).collect();
                assert_eq!(mine.len(), 1);
                assert_eq!(mine[0].new_mode, TargetMode::Normal);
                assert!(!mine[0].is_restrictive());
            }
        }
    }

    #[test]
    fn test_protected_category_covers_installed_apps() {
        let mut s = Strategy::new(Focus::Both, Aggressiveness::VeryAggressive);
        s.protected_categories.insert(AppCategory::Navigation);
        let device = snapshot(
            8.0,
            vec![
                app("com.waze", Some(20.0), Some(150.0)),
                app("com.example.game", Some(25.0), Some(300.0)),
            ],
        );

        let actions = run(&s, &device);
        assert_eq!(types_for(&actions, "com.waze"), vec![ActionableType::SetStandbyBucket]);
        assert_eq!(
            types_for(&actions, "com.example.game"),
            vec![ActionableType::RestrictBackground, ActionableType::RestrictBackgroundData]
        );

        let protected = installed_protected(&s, &device, &AppCatalog::default());
        assert_eq!(protected, BTreeSet::from(["com.waze".to_string()]));
    }

    #[test]
    fn test_duplicate_apps_processed_once() {
        let s = Strategy::new(Focus::Battery, Aggressiveness::Minimal);
        let actions = run(
            &s,
            &snapshot(
                80.0,
                vec![app("com.example", Some(5.0), None), app("com.example", Some(5.0), None)],
            ),
        );
        assert_eq!(types_for(&actions, "com.example").len(), 1);
    }

    #[test]
    fn test_id_format() {
        let s = Strategy::new(Focus::Battery, Aggressiveness::Minimal);
        let actions = run(&s, &snapshot(80.0, vec![app("com.example", Some(5.0), None)]));
        let batt = actions.iter().find(|a| a.package_name == "com.example").unwrap();
        let suffix = batt.id.strip_prefix("batt-com.example-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

        let sys = actions.iter().find(|a| a.is_system()).unwrap();
        assert!(sys.id.starts_with("sys-system-"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let s = Strategy::new(Focus::Battery, Aggressiveness::Minimal);
        let mut named = app("com.example.custom", Some(5.0), None);
        named.app_name = "Custom App".to_string();
        let actions = run(
            &s,
            &snapshot(80.0, vec![named, app("com.spotify.music", Some(5.0), None)]),
        );
        assert!(actions.iter().any(|a| a.description.contains("Custom App")));
        assert!(actions.iter().any(|a| a.description.contains("Spotify")));
    }
}
