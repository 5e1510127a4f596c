//! Backend wire records
//!
//! The capture backend hands the dashboard three kinds of batches:
//! - window focus events per session (`timestamp`, `app_name`, `title`, `duration`)
//! - per-day summaries (`date`, `total_diffs`, ...)
//! - per-session start/end pairs
//!
//! Unknown fields are ignored so backend additions do not break parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DailyActivityStat, SessionSpan, WindowFocusEvent};

/// Date format used by the backend for daily rows
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Records that can be checked before conversion
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;

    /// Short human-readable identifier used in reports
    fn describe(&self) -> String;
}

/// Window focus event as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEventRecord {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub app_name: String,
    #[serde(default)]
    pub title: String,
    /// Focus duration in seconds
    pub duration: f64,
}

impl WindowEventRecord {
    pub fn to_event(&self) -> WindowFocusEvent {
        WindowFocusEvent {
            timestamp: self.timestamp,
            app_name: self.app_name.clone(),
            title: self.title.clone(),
            duration_seconds: self.duration,
        }
    }
}

impl Validate for WindowEventRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp < 0 {
            return Err(ValidationError::NegativeTimestamp(self.timestamp));
        }
        if self.app_name.trim().is_empty() {
            return Err(ValidationError::EmptyAppName);
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ValidationError::InvalidDuration(self.duration));
        }
        // the focus interval must end on a representable instant
        let end_ms = self.timestamp as f64 + self.duration * 1000.0;
        if end_ms >= i64::MAX as f64 {
            return Err(ValidationError::InvalidDuration(self.duration));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.app_name, self.timestamp)
    }
}

/// Start/end pair of one backend session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
}

impl SessionRecord {
    pub fn to_span(&self) -> SessionSpan {
        SessionSpan {
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

impl Validate for SessionRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.start_time < 0 {
            return Err(ValidationError::NegativeTimestamp(self.start_time));
        }
        if self.end_time < self.start_time {
            return Err(ValidationError::InvertedSession {
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("session {}..{}", self.start_time, self.end_time)
    }
}

/// Daily summary row as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryRecord {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Code-diff count for the day
    pub total_diffs: u32,
    /// Coding minutes for the day
    #[serde(default)]
    pub total_coding: u32,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl DailySummaryRecord {
    pub fn parse_date(&self) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(self.date.clone()))
    }

    pub fn to_stat(&self) -> Result<DailyActivityStat, ValidationError> {
        Ok(DailyActivityStat {
            date: self.parse_date()?,
            change_count: self.total_diffs,
            sessions: self.sessions.iter().map(SessionRecord::to_span).collect(),
        })
    }
}

impl Validate for DailySummaryRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        self.parse_date()?;
        for session in &self.sessions {
            session.validate()?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.date.clone()
    }
}

/// Validation errors for backend records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Negative timestamp: {0}")]
    NegativeTimestamp(i64),

    #[error("Empty app name")]
    EmptyAppName,

    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),

    #[error("Session ends before it starts: {start_time} > {end_time}")]
    InvertedSession { start_time: i64, end_time: i64 },

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}
