//! Domain models for the optimization pipeline.

pub mod actionable;
pub mod analysis;
pub mod classification;
pub mod device_snapshot;
pub mod insight;
pub mod strategy;
pub mod usage_pattern;

pub use actionable::{Actionable, ActionableType, TargetMode, SYSTEM_TARGET};
pub use analysis::{AnalysisResult, EstimatedSavings, ResponseType, Scores};
pub use classification::{Activity, PromptClassification};
pub use device_snapshot::{
    AppUsageRecord, BatteryInfo, CpuInfo, DataUsage, DeviceInfo, DeviceSettings, DeviceSnapshot,
    MemoryInfo, NetworkInfo, DEFAULT_BATTERY_LEVEL,
};
pub use insight::{Insight, InsightSeverity, InsightType};
pub use strategy::{Aggressiveness, AppCategory, Focus, Strategy};
pub use usage_pattern::UsagePattern;
