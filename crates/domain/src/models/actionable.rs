//! Actionable models: concrete device-configuration changes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Pseudo-target for device-wide actions.
pub const SYSTEM_TARGET: &str = "system";

/// The fixed set of configuration changes the device agent understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionableType {
    KillApp,
    RestrictBackground,
    RestrictBackgroundData,
    OptimizeBattery,
    MarkAppInactive,
    SetStandbyBucket,
    EnableBatterySaver,
    EnableDataSaver,
    AdjustSyncSettings,
    AdjustScreenSettings,
    ManageWakeLocks,
    ThrottleCpuUsage,
    CategorizeApp,
}

impl ActionableType {
    /// Type substituted for values the agent would not recognize.
    pub const SAFE_DEFAULT: ActionableType = ActionableType::OptimizeBattery;

    pub const ALL: [ActionableType; 13] = [
        ActionableType::KillApp,
        ActionableType::RestrictBackground,
        ActionableType::RestrictBackgroundData,
        ActionableType::OptimizeBattery,
        ActionableType::MarkAppInactive,
        ActionableType::SetStandbyBucket,
        ActionableType::EnableBatterySaver,
        ActionableType::EnableDataSaver,
        ActionableType::AdjustSyncSettings,
        ActionableType::AdjustScreenSettings,
        ActionableType::ManageWakeLocks,
        ActionableType::ThrottleCpuUsage,
        ActionableType::CategorizeApp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionableType::KillApp => "KILL_APP",
            ActionableType::RestrictBackground => "RESTRICT_BACKGROUND",
            ActionableType::RestrictBackgroundData => "RESTRICT_BACKGROUND_DATA",
            ActionableType::OptimizeBattery => "OPTIMIZE_BATTERY",
            ActionableType::MarkAppInactive => "MARK_APP_INACTIVE",
            ActionableType::SetStandbyBucket => "SET_STANDBY_BUCKET",
            ActionableType::EnableBatterySaver => "ENABLE_BATTERY_SAVER",
            ActionableType::EnableDataSaver => "ENABLE_DATA_SAVER",
            ActionableType::AdjustSyncSettings => "ADJUST_SYNC_SETTINGS",
            ActionableType::AdjustScreenSettings => "ADJUST_SCREEN_SETTINGS",
            ActionableType::ManageWakeLocks => "MANAGE_WAKE_LOCKS",
            ActionableType::ThrottleCpuUsage => "THROTTLE_CPU_USAGE",
            ActionableType::CategorizeApp => "CATEGORIZE_APP",
        }
    }

    /// Strict parse, case-insensitive. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    /// Lenient parse: unknown values become [`Self::SAFE_DEFAULT`].
    pub fn coerce(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            tracing::warn!(
                actionable_type = value,
                fallback = Self::SAFE_DEFAULT.as_str(),
                "Unknown actionable type coerced to safe default"
            );
            Self::SAFE_DEFAULT
        })
    }

    /// Focus hints associated with the battery goal.
    pub fn battery_focus() -> &'static [ActionableType] {
        &[
            ActionableType::SetStandbyBucket,
            ActionableType::ManageWakeLocks,
            ActionableType::ThrottleCpuUsage,
        ]
    }

    /// Focus hints associated with the data goal.
    pub fn data_focus() -> &'static [ActionableType] {
        &[ActionableType::RestrictBackgroundData, ActionableType::KillApp]
    }
}

impl std::fmt::Display for ActionableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionableType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ActionableType::coerce(&raw))
    }
}

/// Mode the target is moved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    Normal,
    Optimized,
    Restricted,
    Reduced,
    Enabled,
    Dimmed,
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMode::Normal => write!(f, "normal"),
            TargetMode::Optimized => write!(f, "optimized"),
            TargetMode::Restricted => write!(f, "restricted"),
            TargetMode::Reduced => write!(f, "reduced"),
            TargetMode::Enabled => write!(f, "enabled"),
            TargetMode::Dimmed => write!(f, "dimmed"),
        }
    }
}

/// One recommended configuration change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actionable {
    pub id: String,
    #[serde(rename = "type")]
    pub actionable_type: ActionableType,
    /// Target package, or [`SYSTEM_TARGET`]
    pub package_name: String,
    pub description: String,
    pub reason: String,
    pub new_mode: TargetMode,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Actionable {
    pub fn is_system(&self) -> bool {
        self.package_name == SYSTEM_TARGET
    }

    /// Whether this action limits what the target app may do.
    pub fn is_restrictive(&self) -> bool {
        self.new_mode != TargetMode::Normal
            && matches!(
                self.actionable_type,
                ActionableType::KillApp
                    | ActionableType::RestrictBackground
                    | ActionableType::RestrictBackgroundData
                    | ActionableType::MarkAppInactive
                    | ActionableType::ThrottleCpuUsage
                    | ActionableType::SetStandbyBucket
            )
    }
}
