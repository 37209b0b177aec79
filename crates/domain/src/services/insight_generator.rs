//! Human-readable insights.
//!
//! Savings figures are never computed here; they are passed in so the text
//! always quotes the same numbers as the response body.

use lazy_static::lazy_static;
use std::collections::BTreeSet;

use super::constraint_extractor::Constraints;
use super::rules::RuleSet;
use crate::config::{AppCatalog, StrategyConfig};
use crate::models::{
    Activity, AppUsageRecord, DeviceSnapshot, EstimatedSavings, Focus, Insight, InsightSeverity,
    InsightType, Strategy,
};

/// Battery usage (%) above which an app is named in the savings insight.
const BATTERY_HEAVY_PERCENT: f64 = 10.0;
/// Data usage (MB) above which an app is named in the savings insight.
const DATA_HEAVY_MB: f64 = 50.0;
/// Apps listed by name before "and N more".
const LISTED_APPS: usize = 3;

lazy_static! {
    static ref BATTERY_QUERY: RuleSet<()> =
        RuleSet::from_table([(r"\b(battery|power|charge|draining|drain)\b", ())]).unwrap();
    static ref DATA_QUERY: RuleSet<()> =
        RuleSet::from_table([(r"\b(data|internet|network|mb|gb)\b", ())]).unwrap();
}

/// Everything the optimization insights are derived from.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub strategy: &'a Strategy,
    pub snapshot: &'a DeviceSnapshot,
    /// Installed apps kept running, by name or category
    pub protected: &'a BTreeSet<String>,
    pub savings: EstimatedSavings,
    pub catalog: &'a AppCatalog,
    pub config: &'a StrategyConfig,
}

impl InsightContext<'_> {
    fn app_name<'n>(&'n self, app: &'n AppUsageRecord) -> &'n str {
        self.catalog
            .display_name(&app.package_name)
            .unwrap_or_else(|| app.label())
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

fn name_list(names: &[String]) -> String {
    if names.len() > LISTED_APPS {
        format!(
            "{}, and {} more apps",
            names[..LISTED_APPS].join(", "),
            names.len() - LISTED_APPS
        )
    } else {
        names.join(", ")
    }
}

fn focus_label(focus: Focus) -> &'static str {
    match focus {
        Focus::Battery => "battery",
        Focus::Data => "data",
        Focus::Both => "battery and data",
    }
}

fn strategy_description(ctx: &InsightContext<'_>) -> String {
    let strategy = ctx.strategy;
    let level = ctx.snapshot.battery_level();
    let mut lines = Vec::new();

    match (strategy.focus, strategy.data_constraint_mb) {
        (Focus::Data, Some(mb)) => {
            lines.push(format!("Optimizing data usage with {:.0} MB remaining", mb))
        }
        (Focus::Data, None) => lines.push("Optimizing data consumption for your device".to_string()),
        _ => {
            if level <= ctx.config.critical_battery_warning {
                lines.push(format!(
                    "As battery is critically low ({:.0}%), taking aggressive measures",
                    level
                ));
            } else if level <= ctx.config.low_battery_warning {
                lines.push(format!("As battery is low ({:.0}%), optimizing usage", level));
            } else if level > 80.0 {
                lines.push(format!(
                    "As battery is sufficient ({:.0}%), taking minimal measures",
                    level
                ));
            }
        }
    }

    if strategy.aggressiveness.is_aggressive() {
        lines.push("Restricted background activity for non-critical apps".to_string());
    } else {
        lines.push(format!(
            "Applied {} optimization for non-critical apps",
            strategy.aggressiveness.label()
        ));
    }

    if !ctx.protected.is_empty() {
        lines.push(format!(
            "Keeping {} running normally",
            plural(ctx.protected.len() as u32, "protected app")
        ));
    }

    if let Some(minutes) = strategy.time_constraint_minutes {
        lines.push(format!("Targeting {} of use", plural(minutes / 60, "hour")));
    }

    let mut estimates = Vec::new();
    if strategy.show_battery_savings {
        estimates.push(format!("{} minutes of battery life", ctx.savings.battery_minutes));
    }
    if strategy.show_data_savings {
        estimates.push(format!("{} MB of data", ctx.savings.data_mb));
    }
    if !estimates.is_empty() {
        lines.push(format!("Estimated savings: {}", estimates.join(" and ")));
    }

    lines.join("\n")
}

/// Insights for an optimization response, in display order.
pub fn optimization_insights(ctx: &InsightContext<'_>) -> Vec<Insight> {
    let strategy = ctx.strategy;
    let level = ctx.snapshot.battery_level();
    let mut insights = vec![Insight::new(
        InsightType::Strategy,
        format!("Designed a custom {} strategy for you", focus_label(strategy.focus)),
        strategy_description(ctx),
        InsightSeverity::Low,
    )];

    if level <= ctx.config.critical_battery_warning {
        insights.push(Insight::new(
            InsightType::BatteryWarning,
            "Critical Battery Level",
            format!(
                "Battery level is critically low at {:.0}%. Taking aggressive measures to extend battery life.",
                level
            ),
            InsightSeverity::High,
        ));
    } else if level <= ctx.config.low_battery_warning {
        insights.push(Insight::new(
            InsightType::BatteryWarning,
            "Low Battery Level",
            format!(
                "Battery level is low at {:.0}%. Optimizing usage to extend battery life.",
                level
            ),
            InsightSeverity::Medium,
        ));
    }

    if let Some(mb) = strategy.data_constraint_mb {
        insights.push(Insight::new(
            InsightType::DataWarning,
            "Limited Data Remaining",
            format!(
                "You have {:.0} MB of data remaining. Restricting background data usage to conserve data.",
                mb
            ),
            InsightSeverity::Medium,
        ));
    }

    if let Some(minutes) = strategy.time_constraint_minutes {
        let hours = plural(minutes / 60, "hour");
        insights.push(Insight::new(
            InsightType::TimeConstraint,
            format!("Optimizing to last {}", hours),
            format!("Adjusting power management so the device lasts for {}.", hours),
            InsightSeverity::Medium,
        ));
    }

    if !ctx.protected.is_empty() {
        let names: Vec<String> = ctx
            .protected
            .iter()
            .map(|p| ctx.catalog.display_name(p).unwrap_or(p.as_str()).to_string())
            .collect();
        insights.push(Insight::new(
            InsightType::CriticalApps,
            "Protected Critical Apps",
            format!("Maintaining full functionality for: {}", names.join(", ")),
            InsightSeverity::Low,
        ));
    }

    if strategy.show_battery_savings && ctx.savings.battery_minutes > 0 {
        let heavy: Vec<String> = ctx
            .snapshot
            .apps
            .iter()
            .filter(|a| a.battery_usage.is_some_and(|b| b > BATTERY_HEAVY_PERCENT))
            .filter(|a| !ctx.protected.contains(&a.package_name))
            .map(|a| ctx.app_name(a).to_string())
            .collect();
        let mut description = format!(
            "Estimated battery extension: {} minutes",
            ctx.savings.battery_minutes
        );
        if !heavy.is_empty() {
            description.push_str(&format!(
                "\nOptimizing battery usage for: {}.",
                name_list(&heavy)
            ));
        }
        insights.push(Insight::new(
            InsightType::BatterySavings,
            "Extended Battery Life",
            description,
            InsightSeverity::Low,
        ));
    }

    if strategy.show_data_savings && ctx.savings.data_mb > 0 {
        let heavy: Vec<String> = ctx
            .snapshot
            .apps
            .iter()
            .filter(|a| a.data_usage_mb().is_some_and(|d| d > DATA_HEAVY_MB))
            .filter(|a| !ctx.protected.contains(&a.package_name))
            .map(|a| ctx.app_name(a).to_string())
            .collect();
        let mut description = format!("Estimated data savings: {} MB", ctx.savings.data_mb);
        if !heavy.is_empty() {
            description.push_str(&format!("\nOptimizing data usage for: {}.", name_list(&heavy)));
        }
        insights.push(Insight::new(
            InsightType::DataSavings,
            "Reduced Data Usage",
            description,
            InsightSeverity::Low,
        ));
    }

    insights
}

/// Number of apps to list for an information request.
pub fn requested_app_count(constraints: &Constraints, config: &StrategyConfig) -> usize {
    constraints
        .app_count
        .unwrap_or(config.default_top_apps)
        .clamp(1, config.max_top_apps.max(1))
}

fn top_consumers<F>(snapshot: &DeviceSnapshot, count: usize, usage: F) -> Vec<(&AppUsageRecord, f64)>
where
    F: Fn(&AppUsageRecord) -> Option<f64>,
{
    let mut ranked: Vec<(&AppUsageRecord, f64)> = snapshot
        .apps
        .iter()
        .filter_map(|app| usage(app).filter(|u| *u > 0.0).map(|u| (app, u)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(count);
    ranked
}

/// Insights answering "which apps use the most ..." questions.
pub fn information_insights(
    prompt: &str,
    snapshot: &DeviceSnapshot,
    constraints: &Constraints,
    catalog: &AppCatalog,
    config: &StrategyConfig,
) -> Vec<Insight> {
    let count = requested_app_count(constraints, config);
    let mut battery = BATTERY_QUERY.any(prompt);
    let mut data = DATA_QUERY.any(prompt);
    if !battery && !data {
        battery = true;
        data = true;
    }

    let name = |app: &AppUsageRecord| -> String {
        catalog
            .display_name(&app.package_name)
            .unwrap_or_else(|| app.label())
            .to_string()
    };

    let mut insights = Vec::new();

    if battery {
        let top = top_consumers(snapshot, count, |a| a.battery_usage);
        insights.push(if top.is_empty() {
            Insight::new(
                InsightType::BatteryInformation,
                "Battery Usage Information",
                "No significant battery usage detected for any apps.",
                InsightSeverity::Low,
            )
        } else {
            let lines: Vec<String> = top
                .iter()
                .map(|(app, usage)| format!("- {}: {:.1}%", name(app), usage))
                .collect();
            Insight::new(
                InsightType::BatteryInformation,
                format!("Top {} Battery Consuming Apps", top.len()),
                format!(
                    "The following apps are consuming the most battery:\n{}",
                    lines.join("\n")
                ),
                InsightSeverity::Low,
            )
        });
    }

    if data {
        let top = top_consumers(snapshot, count, AppUsageRecord::data_usage_mb);
        insights.push(if top.is_empty() {
            Insight::new(
                InsightType::DataInformation,
                "Data Usage Information",
                "No significant data usage detected for any apps.",
                InsightSeverity::Low,
            )
        } else {
            let lines: Vec<String> = top
                .iter()
                .map(|(app, usage)| format!("- {}: {:.1} MB", name(app), usage))
                .collect();
            Insight::new(
                InsightType::DataInformation,
                format!("Top {} Data Consuming Apps", top.len()),
                format!(
                    "The following apps are consuming the most data:\n{}",
                    lines.join("\n")
                ),
                InsightSeverity::Low,
            )
        });
    }

    insights
}

/// Outcome of a feasibility question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    Yes,
    YesWithOptimization,
    No,
}

/// Hours of `activity` the current charge supports.
pub fn hours_supported(activity: Activity, battery_level: f64, config: &StrategyConfig) -> f64 {
    let rate = config.drain_rates.rate_for(activity);
    if rate > 0.0 {
        battery_level / rate
    } else {
        f64::INFINITY
    }
}

/// Decide a feasibility question.
///
/// "Yes" needs more headroom than the configured margin; "yes with
/// optimization" holds when the estimated battery savings close the gap.
pub fn feasibility(
    supported: f64,
    requested_hours: u32,
    savings: EstimatedSavings,
    config: &StrategyConfig,
) -> Feasibility {
    let requested = requested_hours.max(1) as f64;
    let margin = (supported - requested) / requested;
    if margin > config.feasibility_margin {
        Feasibility::Yes
    } else if supported + savings.battery_minutes as f64 / 60.0 >= requested {
        Feasibility::YesWithOptimization
    } else {
        Feasibility::No
    }
}

/// The single insight answering a yes/no question.
pub fn yes_no_insight(
    activity: Activity,
    battery_level: f64,
    requested_hours: Option<u32>,
    savings: EstimatedSavings,
    config: &StrategyConfig,
) -> Insight {
    let requested = requested_hours.unwrap_or(1).max(1);
    let hours = hours_supported(activity, battery_level, config);
    let duration = plural(requested, "hour");
    let phrase = activity.phrase();

    let insight = match feasibility(hours, requested, savings, config) {
        Feasibility::Yes => Insight::new(
            InsightType::YesNo,
            "Yes, you can!",
            format!(
                "Yes, you can {} for {} with {:.0}% battery. Your battery should last about {:.1} hours for this.",
                phrase, duration, battery_level, hours
            ),
            InsightSeverity::Low,
        ),
        Feasibility::YesWithOptimization => Insight::new(
            InsightType::YesNo,
            "Yes, with optimization",
            format!(
                "Yes, you can {} for {} with {:.0}% battery if you apply the recommended optimizations, which add about {} minutes of battery life.",
                phrase, duration, battery_level, savings.battery_minutes
            ),
            InsightSeverity::Medium,
        ),
        Feasibility::No => Insight::new(
            InsightType::YesNo,
            "No, insufficient battery",
            format!(
                "No, {:.0}% battery is not enough to {} for {}. You can only {} for about {:.1} hours, even with about {} minutes gained from optimization.",
                battery_level, phrase, duration, phrase, hours, savings.battery_minutes
            ),
            InsightSeverity::High,
        ),
    };

    tracing::debug!(
        activity = %activity,
        hours_supported = hours,
        requested_hours = requested,
        title = %insight.title,
        "Answered feasibility question"
    );

    insight
}

/// Insight used when nothing else was produced.
pub fn fallback_insight() -> Insight {
    Insight::new(
        InsightType::Information,
        "Analysis Complete",
        "Your device is running efficiently. No specific optimizations are needed right now.",
        InsightSeverity::Low,
    )
}

/// Guarantee at least one insight.
pub fn with_fallback(mut insights: Vec<Insight>) -> Vec<Insight> {
    if insights.is_empty() {
        insights.push(fallback_insight());
    }
    insights
}
