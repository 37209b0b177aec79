//! Numeric and protection constraints pulled out of prompt text.

use lazy_static::lazy_static;
use std::collections::BTreeSet;

use super::rules::RuleSet;
use crate::config::AppCatalog;
use crate::models::{Activity, AppCategory};

lazy_static! {
    static ref TIME_RULES: RuleSet<()> = RuleSet::from_table([
        (r"(\d+)\s*hours?\b", ()),
        (r"(\d+)\s*hrs?\b", ()),
        (r"(\d+)\s*h\b", ()),
        // "for 500 mb" or "for 3 apps" are not durations.
        (r"\bfor\s+(\d+)\s*(mb|gb|%|percent|min|mins|minutes?|apps?|days?)?", ()),
    ])
    .unwrap();
    static ref DATA_RULE: RuleSet<f64> =
        RuleSet::from_table([(r"(\d+(?:\.\d+)?)\s*(mb|gb)\b", 1.0)]).unwrap();
    static ref CATEGORY_RULES: RuleSet<AppCategory> = RuleSet::from_table([
        (
            r"\b(ensure|keep|make sure)\b.*\be-?mail\b.*\b(works?|working|running|available)\b",
            AppCategory::Email,
        ),
        (
            r"\b(message|messages|messaging|chat|whatsapp|text|texts|texting)\b",
            AppCategory::Messaging,
        ),
        (
            r"\b(map|maps|navigation|navigate|directions|gps|waze)\b",
            AppCategory::Navigation,
        ),
        (
            r"\b(email|emails|e-mail|mail|gmail|outlook|inbox)\b",
            AppCategory::Email,
        ),
    ])
    .unwrap();
    static ref KEEP_WORKING_RULE: RuleSet<()> =
        RuleSet::from_table([(r"\bkeep\s+(?:my\s+)?([\w.-]+)\s+(?:working|running)\b", ())])
            .unwrap();
    static ref ACTIVITY_RULES: RuleSet<Activity> = RuleSet::from_table([
        (r"\byoutube\b", Activity::YouTube),
        (r"\bnetflix\b", Activity::Netflix),
        (r"\b(game|games|gaming)\b", Activity::Gaming),
        (r"\b(stream|streaming|video|videos|watch|watching)\b", Activity::VideoStreaming),
        (r"\b(navigation|navigate|navigating|maps|directions|gps)\b", Activity::Navigation),
        (r"\b(call|calls|calling)\b", Activity::Calls),
        (r"\b(browse|browsing|web)\b", Activity::Browsing),
        (r"\b(message|messages|messaging|text|texting|chat)\b", Activity::Messaging),
        (r"\buse\b", Activity::General),
    ])
    .unwrap();
    static ref APP_COUNT_RULES: RuleSet<()> =
        RuleSet::from_table([(r"\btop\s+(\d+)", ()), (r"\b(\d+)\s+apps?\b", ())]).unwrap();
}

/// Constraints found in a prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Requested battery life in whole hours
    pub time_hours: Option<u32>,
    /// Data budget in MB
    pub data_mb: Option<f64>,
    pub critical_categories: BTreeSet<AppCategory>,
    /// Apps excluded from restrictive actions by name. Category protection
    /// is resolved against the installed apps later.
    pub protected_apps: BTreeSet<String>,
    /// Apps named explicitly in the prompt
    pub named_apps: BTreeSet<String>,
    pub activity: Option<Activity>,
    /// Requested list size ("top 5", "3 apps"), unclamped
    pub app_count: Option<usize>,
}

impl Constraints {
    pub fn time_minutes(&self) -> Option<u32> {
        self.time_hours.map(|h| h.saturating_mul(60))
    }
}

/// Extracts [`Constraints`] using the app catalog for name lookups.
#[derive(Debug, Clone)]
pub struct ConstraintExtractor {
    named_app_rules: RuleSet<String>,
}

impl ConstraintExtractor {
    pub fn new(catalog: &AppCatalog) -> Self {
        let mut named_app_rules = RuleSet::new();
        for (name, package) in catalog.named_apps() {
            let name = regex::escape(name);
            let rows = [
                format!(
                    r"\b(?:keep|need|using|use|watch|stream|open|running)\s+(?:my\s+)?{}\b",
                    name
                ),
                format!(r"\b{}\s+(?:working|running|active|open)\b", name),
            ];
            for row in rows {
                if let Err(e) = named_app_rules.push(&row, package.to_string()) {
                    tracing::warn!(pattern = %row, error = %e, "Skipping app name pattern");
                }
            }
        }

        Self { named_app_rules }
    }

    pub fn extract(&self, prompt: &str) -> Constraints {
        let mut constraints = Constraints {
            time_hours: extract_time_hours(prompt),
            data_mb: extract_data_mb(prompt),
            activity: detect_activity(prompt),
            app_count: extract_app_count(prompt),
            ..Default::default()
        };

        constraints.critical_categories = CATEGORY_RULES.matches(prompt).copied().collect();
        if let Some((caps, _)) = KEEP_WORKING_RULE.first_capture(prompt) {
            if caps[1].to_ascii_lowercase().contains("mail") {
                constraints.critical_categories.insert(AppCategory::Email);
            }
        }

        constraints.named_apps = self.named_app_rules.matches(prompt).cloned().collect();

        constraints.protected_apps = constraints.named_apps.clone();

        tracing::debug!(
            time_hours = ?constraints.time_hours,
            data_mb = ?constraints.data_mb,
            categories = ?constraints.critical_categories,
            named_apps = ?constraints.named_apps,
            "Extracted prompt constraints"
        );

        constraints
    }
}

fn extract_time_hours(prompt: &str) -> Option<u32> {
    let (caps, _) = TIME_RULES.first_capture(prompt)?;
    if caps.get(2).is_some() {
        return None;
    }
    caps[1].parse::<u32>().ok().filter(|hours| *hours > 0)
}

fn extract_data_mb(prompt: &str) -> Option<f64> {
    let (caps, _) = DATA_RULE.first_capture(prompt)?;
    let amount: f64 = caps[1].parse().ok()?;
    if caps[2].eq_ignore_ascii_case("gb") {
        Some(amount * 1000.0)
    } else {
        Some(amount)
    }
}

/// Activity named in the prompt, most specific first.
pub fn detect_activity(prompt: &str) -> Option<Activity> {
    ACTIVITY_RULES.first(prompt).copied()
}

fn extract_app_count(prompt: &str) -> Option<usize> {
    let (caps, _) = APP_COUNT_RULES.first_capture(prompt)?;
    caps[1].parse().ok()
}
