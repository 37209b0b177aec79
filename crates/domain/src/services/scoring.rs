//! Resource-health scores.
//!
//! Each score is computed independently. A score whose inputs are unusable
//! (non-finite arithmetic) falls back to the neutral value instead of
//! failing the request.

use crate::models::{DeviceSnapshot, Scores};

const MAX_SCORE: f64 = 100.0;
const NEUTRAL_SCORE: f64 = 50.0;

fn finish(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, MAX_SCORE).round()
    } else {
        NEUTRAL_SCORE
    }
}

/// Battery score from level, health, temperature and power settings.
pub fn battery_score(snapshot: &DeviceSnapshot) -> f64 {
    let battery = &snapshot.battery;
    let mut score = (snapshot.battery_level() + 40.0).min(MAX_SCORE);

    // Android health code 2 is "good"
    match battery.health {
        Some(h) if h < 2.0 => score -= 20.0,
        Some(h) if h > 2.0 => score += 10.0,
        _ => {}
    }

    match battery.temperature {
        Some(t) if t > 40.0 => score -= 15.0,
        Some(t) if t > 35.0 => score -= 5.0,
        _ => {}
    }

    if let Some(settings) = &snapshot.settings {
        if settings.power_save_mode {
            score += 10.0;
        }
        if settings.battery_optimization {
            score += 5.0;
        }
    }
    if battery.is_charging {
        score += 5.0;
    }

    finish(score)
}

/// Data score from the background share of traffic and network conditions.
pub fn data_score(snapshot: &DeviceSnapshot) -> f64 {
    let usage = &snapshot.network.data_usage;
    let total = usage.total_mb().unwrap_or(0.0);
    if total <= 0.0 {
        return 90.0;
    }

    let mut score = 80.0;
    match usage.background_ratio() {
        Some(r) if r > 0.7 => score -= 20.0,
        Some(r) if r > 0.5 => score -= 10.0,
        Some(r) if r < 0.3 => score += 10.0,
        _ => {}
    }

    if snapshot.network.is_wifi() {
        score += 15.0;
    } else if snapshot.network.is_cellular() && snapshot.network.is_roaming {
        score -= 20.0;
    }

    if let Some(settings) = &snapshot.settings {
        if settings.data_saver {
            score += 15.0;
        }
        if !settings.auto_sync {
            score += 5.0;
        }
    }

    finish(score)
}

/// Performance score from memory pressure, CPU load and crash counts.
pub fn performance_score(snapshot: &DeviceSnapshot) -> f64 {
    let mut score = 70.0;

    match snapshot.memory.free_percent() {
        Some(free) if free < 15.0 => score -= 25.0,
        Some(free) if free < 30.0 => score -= 15.0,
        Some(free) if free > 60.0 => score += 15.0,
        _ => {}
    }
    if snapshot.memory.low_memory {
        score -= 20.0;
    }

    match snapshot.cpu.usage {
        Some(cpu) if cpu > 70.0 => score -= 15.0,
        Some(cpu) if cpu < 30.0 => score += 10.0,
        _ => {}
    }

    let crashes: u32 = snapshot.apps.iter().map(|a| a.crashes).sum();
    if crashes > 3 {
        score -= 20.0;
    } else if crashes > 0 {
        score -= 10.0;
    }

    finish(score)
}

/// All three scores for a snapshot.
pub fn score(snapshot: &DeviceSnapshot) -> Scores {
    Scores {
        battery: battery_score(snapshot),
        data: data_score(snapshot),
        performance: performance_score(snapshot),
    }
}
