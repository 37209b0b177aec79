//! Strategy models for the optimization pipeline.
//!
//! A [`Strategy`] is built by the resolver, refined by the priority balancer
//! and then treated as read-only by every generator. Each stage returns a new
//! value instead of mutating a shared one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which resource the current strategy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Battery,
    Data,
    Both,
}

impl Focus {
    /// Derive focus from the two optimization goals.
    ///
    /// Anything other than exactly one goal means both resources.
    pub fn from_goals(battery: bool, data: bool) -> Self {
        match (battery, data) {
            (true, false) => Focus::Battery,
            (false, true) => Focus::Data,
            _ => Focus::Both,
        }
    }

    pub fn includes_battery(self) -> bool {
        matches!(self, Focus::Battery | Focus::Both)
    }

    pub fn includes_data(self) -> bool {
        matches!(self, Focus::Data | Focus::Both)
    }

    /// Add battery to the focus set.
    pub fn with_battery(self) -> Self {
        match self {
            Focus::Data => Focus::Both,
            other => other,
        }
    }

    /// Add data to the focus set.
    pub fn with_data(self) -> Self {
        match self {
            Focus::Battery => Focus::Both,
            other => other,
        }
    }
}

impl std::fmt::Display for Focus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Focus::Battery => write!(f, "battery"),
            Focus::Data => write!(f, "data"),
            Focus::Both => write!(f, "both"),
        }
    }
}

/// Ordered severity of applied restrictions.
///
/// The derive order is the severity order: `Minimal < Moderate < Aggressive < VeryAggressive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    Minimal,
    #[serde(alias = "balanced")]
    Moderate,
    Aggressive,
    VeryAggressive,
}

impl Aggressiveness {
    /// Whether restrictive per-app actions are warranted.
    pub fn is_aggressive(self) -> bool {
        self >= Aggressiveness::Aggressive
    }

    /// Human-readable label used in insight prose.
    pub fn label(self) -> &'static str {
        match self {
            Aggressiveness::Minimal => "minimal",
            Aggressiveness::Moderate => "moderate",
            Aggressiveness::Aggressive => "aggressive",
            Aggressiveness::VeryAggressive => "very aggressive",
        }
    }
}

impl std::fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggressiveness::Minimal => write!(f, "minimal"),
            Aggressiveness::Moderate => write!(f, "moderate"),
            Aggressiveness::Aggressive => write!(f, "aggressive"),
            Aggressiveness::VeryAggressive => write!(f, "very_aggressive"),
        }
    }
}

/// App classes that can be protected as a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    Messaging,
    Navigation,
    Email,
    Social,
    Media,
}

impl std::fmt::Display for AppCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppCategory::Messaging => write!(f, "messaging"),
            AppCategory::Navigation => write!(f, "navigation"),
            AppCategory::Email => write!(f, "email"),
            AppCategory::Social => write!(f, "social"),
            AppCategory::Media => write!(f, "media"),
        }
    }
}

/// The resolved optimization strategy for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub focus: Focus,
    pub aggressiveness: Aggressiveness,
    /// Packages excluded from restrictive actions this cycle
    pub protected_apps: BTreeSet<String>,
    pub protected_categories: BTreeSet<AppCategory>,
    pub time_constraint_minutes: Option<u32>,
    #[serde(rename = "dataConstraintMB")]
    pub data_constraint_mb: Option<f64>,
    pub show_battery_savings: bool,
    pub show_data_savings: bool,
}

impl Strategy {
    /// A strategy with no protections or constraints.
    pub fn new(focus: Focus, aggressiveness: Aggressiveness) -> Self {
        Self {
            focus,
            aggressiveness,
            protected_apps: BTreeSet::new(),
            protected_categories: BTreeSet::new(),
            time_constraint_minutes: None,
            data_constraint_mb: None,
            show_battery_savings: false,
            show_data_savings: false,
        }
    }

    pub fn is_protected(&self, package_name: &str) -> bool {
        self.protected_apps.contains(package_name)
    }

    /// Protected by name, or through the category the app belongs to.
    pub fn protects(&self, package_name: &str, category: Option<AppCategory>) -> bool {
        self.is_protected(package_name)
            || category.is_some_and(|c| self.protected_categories.contains(&c))
    }

    /// Replace the focus. Any resource newly brought into focus also gets its
    /// savings surfaced; a resource dropped from focus stops being surfaced.
    pub fn refocus(mut self, focus: Focus) -> Self {
        if focus == self.focus {
            return self;
        }
        self.show_battery_savings = focus.includes_battery()
            && (self.show_battery_savings || !self.focus.includes_battery());
        self.show_data_savings =
            focus.includes_data() && (self.show_data_savings || !self.focus.includes_data());
        self.focus = focus;
        self
    }

    /// Refocus for a resource-critical override. Every resource in the new
    /// focus has its savings surfaced, even if the prompt asked for neither.
    pub fn force_focus(self, focus: Focus) -> Self {
        let mut strategy = self.refocus(focus);
        strategy.show_battery_savings |= focus.includes_battery();
        strategy.show_data_savings |= focus.includes_data();
        strategy
    }

    pub fn with_aggressiveness(mut self, aggressiveness: Aggressiveness) -> Self {
        self.aggressiveness = aggressiveness;
        self
    }

    /// Raise aggressiveness to at least `floor`; never lowers it.
    pub fn raise_aggressiveness(mut self, floor: Aggressiveness) -> Self {
        self.aggressiveness = self.aggressiveness.max(floor);
        self
    }
}
