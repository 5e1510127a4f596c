//! Runtime configuration
//!
//! Settings for the aggregation surfaces. The segmentation thresholds are
//! fixed constants in [`crate::segment`] and are not configurable here.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::app_usage::DEFAULT_TOP_APPS_LIMIT;
use crate::error::ComputeError;
use crate::heatmap::MAX_WINDOW_DAYS;

/// Default daily heatmap window in days
pub const DEFAULT_DAILY_WINDOW_DAYS: usize = 30;

/// Largest accepted UTC offset, in minutes (UTC+14:00)
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Configuration for a [`crate::pipeline::PulseProcessor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Local time offset used for hour-of-day bucketing
    pub utc_offset_minutes: i32,
    /// Number of days in the daily heatmap window
    pub daily_window_days: usize,
    /// Apps kept in a usage breakdown (0 keeps all)
    pub top_apps_limit: usize,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            daily_window_days: DEFAULT_DAILY_WINDOW_DAYS,
            top_apps_limit: DEFAULT_TOP_APPS_LIMIT,
        }
    }
}

impl PulseConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: PulseConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !offset_in_range(self.utc_offset_minutes) {
            return Err(ComputeError::InvalidConfig(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }
        check_window_days(self.daily_window_days)
    }

    /// The configured offset as a chrono offset
    pub fn offset(&self) -> Result<FixedOffset, ComputeError> {
        utc_offset(self.utc_offset_minutes)
    }
}

/// Build a fixed offset from minutes east of UTC
pub fn utc_offset(minutes: i32) -> Result<FixedOffset, ComputeError> {
    if !offset_in_range(minutes) {
        return Err(ComputeError::InvalidConfig(format!(
            "UTC offset out of range: {} minutes",
            minutes
        )));
    }
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
        ComputeError::InvalidConfig(format!("UTC offset out of range: {} minutes", minutes))
    })
}

/// Reject empty windows and windows longer than [`MAX_WINDOW_DAYS`]
pub fn check_window_days(days: usize) -> Result<(), ComputeError> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(ComputeError::InvalidConfig(format!(
            "daily window must be 1..={} days, got {}",
            MAX_WINDOW_DAYS, days
        )));
    }
    Ok(())
}

fn offset_in_range(minutes: i32) -> bool {
    (-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes)
}
