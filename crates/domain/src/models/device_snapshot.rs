//! Device telemetry snapshot models.
//!
//! A [`DeviceSnapshot`] is the immutable input of one analysis request. Every
//! nullable reading goes through [`shared::telemetry::deserialize_metric`], so
//! the `-1` "unknown" sentinel is already `None` by the time the pipeline runs.

use serde::{Deserialize, Serialize};
use shared::telemetry::{deserialize_count, deserialize_metric};
use validator::Validate;

/// Battery level assumed when the agent did not report one.
pub const DEFAULT_BATTERY_LEVEL: f64 = 50.0;

/// Bytes per megabyte used when converting memory readings.
const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct BatteryInfo {
    #[serde(deserialize_with = "deserialize_metric")]
    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub level: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub temperature: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub voltage: Option<f64>,
    pub is_charging: bool,
    pub charging_type: Option<String>,
    /// Agent health code; 2 means "good" on Android
    #[serde(deserialize_with = "deserialize_metric")]
    pub health: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub capacity: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub current_now: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryInfo {
    #[serde(deserialize_with = "deserialize_metric")]
    pub total_ram: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub available_ram: Option<f64>,
    pub low_memory: bool,
    #[serde(deserialize_with = "deserialize_metric")]
    pub threshold: Option<f64>,
}

impl MemoryInfo {
    /// Free memory as a percentage of total, when both are known.
    pub fn free_percent(&self) -> Option<f64> {
        match (self.total_ram, self.available_ram) {
            (Some(total), Some(available)) if total > 0.0 => Some(available / total * 100.0),
            _ => None,
        }
    }

    pub fn total_mb(&self) -> Option<f64> {
        self.total_ram.map(|bytes| bytes / BYTES_PER_MB)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuInfo {
    #[serde(deserialize_with = "deserialize_metric")]
    pub usage: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub temperature: Option<f64>,
    pub frequencies: Vec<f64>,
}

/// Foreground/background data counters. Values are megabytes; byte counters
/// are carried through for the agent's benefit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataUsage {
    #[serde(deserialize_with = "deserialize_metric")]
    pub foreground: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub background: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub rx_bytes: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub tx_bytes: Option<f64>,
}

impl DataUsage {
    /// Foreground plus background, or `None` when neither is known.
    pub fn total_mb(&self) -> Option<f64> {
        match (self.foreground, self.background) {
            (None, None) => None,
            (fg, bg) => Some(fg.unwrap_or(0.0) + bg.unwrap_or(0.0)),
        }
    }

    /// Share of traffic that happened in the background.
    pub fn background_ratio(&self) -> Option<f64> {
        let total = self.total_mb()?;
        if total > 0.0 {
            Some(self.background.unwrap_or(0.0) / total)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInfo {
    #[serde(rename = "type")]
    pub network_type: String,
    #[serde(deserialize_with = "deserialize_metric")]
    pub strength: Option<f64>,
    pub is_roaming: bool,
    pub data_usage: DataUsage,
    pub active_connection_info: Option<String>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub link_speed: Option<f64>,
    pub cellular_generation: Option<String>,
}

impl NetworkInfo {
    pub fn is_wifi(&self) -> bool {
        self.network_type.eq_ignore_ascii_case("wifi")
    }

    pub fn is_cellular(&self) -> bool {
        self.network_type.eq_ignore_ascii_case("mobile")
            || self.network_type.eq_ignore_ascii_case("cellular")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSettings {
    pub power_save_mode: bool,
    pub data_saver: bool,
    pub battery_optimization: bool,
    pub adaptive_battery: bool,
    pub auto_sync: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub sdk_version: Option<u32>,
}

/// Per-app usage for the reporting window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AppUsageRecord {
    #[validate(
        length(min = 1, max = 255, message = "Package name must be 1-255 characters"),
        custom(function = "shared::validation::validate_package_name")
    )]
    pub package_name: String,
    pub process_name: Option<String>,
    pub app_name: String,
    pub is_system_app: bool,
    pub last_used: i64,
    /// Seconds in foreground
    #[serde(deserialize_with = "deserialize_metric")]
    pub foreground_time: Option<f64>,
    /// Seconds in background
    #[serde(deserialize_with = "deserialize_metric")]
    pub background_time: Option<f64>,
    /// Percent of battery drained by this app
    #[serde(deserialize_with = "deserialize_metric")]
    pub battery_usage: Option<f64>,
    pub data_usage: Option<DataUsage>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub memory_usage: Option<f64>,
    #[serde(deserialize_with = "deserialize_metric")]
    pub cpu_usage: Option<f64>,
    #[serde(deserialize_with = "deserialize_count")]
    pub notifications: u32,
    #[serde(deserialize_with = "deserialize_count")]
    pub crashes: u32,
    pub version_name: Option<String>,
    pub version_code: Option<i64>,
    pub target_sdk_version: Option<i64>,
    pub install_time: Option<i64>,
    pub updated_time: Option<i64>,
    #[serde(deserialize_with = "deserialize_count")]
    pub alarm_wakeups: u32,
    pub current_priority: Option<String>,
    pub bucket: Option<String>,
}

impl AppUsageRecord {
    /// Total data used by the app in MB, when known.
    pub fn data_usage_mb(&self) -> Option<f64> {
        self.data_usage.as_ref().and_then(DataUsage::total_mb)
    }

    pub fn has_battery_usage(&self) -> bool {
        self.battery_usage.is_some_and(|b| b > 0.0)
    }

    pub fn has_data_usage(&self) -> bool {
        self.data_usage_mb().is_some_and(|d| d > 0.0)
    }

    /// Whether the record carries any usable usage reading at all.
    pub fn has_usage_data(&self) -> bool {
        self.battery_usage.is_some()
            || self.data_usage_mb().is_some()
            || self.foreground_time.is_some()
    }

    /// Name shown to the user: reported app name, else the package.
    pub fn label(&self) -> &str {
        if self.app_name.trim().is_empty() {
            &self.package_name
        } else {
            &self.app_name
        }
    }
}

/// A periodic snapshot of device state plus an optional user goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSnapshot {
    #[validate(custom(function = "shared::validation::validate_device_id"))]
    pub device_id: String,
    /// Unix seconds
    pub timestamp: i64,
    #[validate(nested)]
    pub battery: BatteryInfo,
    pub memory: MemoryInfo,
    pub cpu: CpuInfo,
    pub network: NetworkInfo,
    #[validate(nested)]
    pub apps: Vec<AppUsageRecord>,
    pub settings: Option<DeviceSettings>,
    pub device_info: Option<DeviceInfo>,
    pub prompt: Option<String>,
    /// Data used so far in the billing cycle (MB)
    #[serde(deserialize_with = "deserialize_metric")]
    pub current_data_mb: Option<f64>,
    /// Size of the data plan (MB)
    #[serde(deserialize_with = "deserialize_metric")]
    pub total_data_mb: Option<f64>,
}

impl DeviceSnapshot {
    /// Battery level with the documented default, clamped to 0..=100.
    pub fn battery_level(&self) -> f64 {
        self.battery
            .level
            .unwrap_or(DEFAULT_BATTERY_LEVEL)
            .clamp(0.0, 100.0)
    }

    /// Data used this cycle: the explicit counter, else network totals.
    pub fn data_used_mb(&self) -> Option<f64> {
        self.current_data_mb
            .or_else(|| self.network.data_usage.total_mb())
    }

    /// Drop apps that carry no usable reading.
    pub fn normalized(mut self) -> Self {
        let before = self.apps.len();
        self.apps.retain(AppUsageRecord::has_usage_data);
        if self.apps.len() != before {
            tracing::debug!(
                device_id = %self.device_id,
                dropped = before - self.apps.len(),
                "Dropped apps without usage data"
            );
        }
        self
    }

    /// Trimmed prompt, `None` when absent or blank.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}
