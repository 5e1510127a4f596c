//! Domain types for devpulse
//!
//! These types flow through the segmentation and aggregation stages. They are
//! independent of the backend wire records in [`crate::schema`], which are
//! validated and converted into these before any computation happens.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observed interval during which an application held OS focus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFocusEvent {
    /// Start instant, milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Focused application identifier (process name)
    pub app_name: String,
    /// Window title, possibly empty
    #[serde(default)]
    pub title: String,
    /// Observed focus duration in seconds
    pub duration_seconds: f64,
}

impl WindowFocusEvent {
    pub fn new(timestamp: i64, app_name: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            timestamp,
            app_name: app_name.into(),
            title: String::new(),
            duration_seconds,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Instant at which focus was lost, in epoch milliseconds (saturating)
    pub fn end_time(&self) -> i64 {
        self.timestamp
            .saturating_add(seconds_to_millis(self.duration_seconds))
    }
}

pub(crate) fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Classification of an activity segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    DeepWork,
    Fragmented,
    Break,
}

/// Payload of a work segment (deep work or fragmented)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSpan {
    /// Start of the span, epoch milliseconds
    pub start_time: i64,
    /// End of the span, epoch milliseconds (latest event end seen)
    pub end_time: i64,
    /// Events folded into this span, in timestamp order
    pub events: Vec<WindowFocusEvent>,
    /// App with the greatest cumulative focus duration
    pub primary_app: String,
    /// Number of app changes between consecutive folded events
    pub switch_count: u32,
    /// Sum of the folded event durations
    pub total_duration_seconds: f64,
}

/// Payload of an inferred break
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakSpan {
    pub start_time: i64,
    pub end_time: i64,
    /// Wall-clock gap length in seconds
    pub total_duration_seconds: f64,
}

/// A contiguous, classified span of a session timeline.
///
/// Work variants carry their folded events; breaks carry only the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivitySegment {
    DeepWork(WorkSpan),
    Fragmented(WorkSpan),
    Break(BreakSpan),
}

impl ActivitySegment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            ActivitySegment::DeepWork(_) => SegmentKind::DeepWork,
            ActivitySegment::Fragmented(_) => SegmentKind::Fragmented,
            ActivitySegment::Break(_) => SegmentKind::Break,
        }
    }

    pub fn start_time(&self) -> i64 {
        match self {
            ActivitySegment::DeepWork(w) | ActivitySegment::Fragmented(w) => w.start_time,
            ActivitySegment::Break(b) => b.start_time,
        }
    }

    pub fn end_time(&self) -> i64 {
        match self {
            ActivitySegment::DeepWork(w) | ActivitySegment::Fragmented(w) => w.end_time,
            ActivitySegment::Break(b) => b.end_time,
        }
    }

    pub fn total_duration_seconds(&self) -> f64 {
        match self {
            ActivitySegment::DeepWork(w) | ActivitySegment::Fragmented(w) => {
                w.total_duration_seconds
            }
            ActivitySegment::Break(b) => b.total_duration_seconds,
        }
    }

    /// The work payload, or `None` for a break
    pub fn work(&self) -> Option<&WorkSpan> {
        match self {
            ActivitySegment::DeepWork(w) | ActivitySegment::Fragmented(w) => Some(w),
            ActivitySegment::Break(_) => None,
        }
    }

    /// Folded events (empty for a break)
    pub fn events(&self) -> &[WindowFocusEvent] {
        self.work().map(|w| w.events.as_slice()).unwrap_or(&[])
    }

    pub fn primary_app(&self) -> Option<&str> {
        self.work().map(|w| w.primary_app.as_str())
    }

    pub fn switch_count(&self) -> u32 {
        self.work().map(|w| w.switch_count).unwrap_or(0)
    }

    pub fn is_break(&self) -> bool {
        matches!(self, ActivitySegment::Break(_))
    }
}

/// Per-kind totals over a built timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub segment_count: u32,
    pub deep_work_seconds: f64,
    pub fragmented_seconds: f64,
    pub break_seconds: f64,
    pub total_switches: u32,
    pub longest_deep_work_seconds: f64,
    /// deep / (deep + fragmented), 0 when there is no work time
    pub focus_ratio: f64,
}

/// A start/end pair for one externally defined session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpan {
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
}

/// One row per calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityStat {
    pub date: NaiveDate,
    /// Activity measure for the day (code-diff count)
    pub change_count: u32,
    /// Sessions of that day, used by the hourly variant
    #[serde(default)]
    pub sessions: Vec<SessionSpan>,
}

/// Fixed-length per-bucket intensities, each in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntensityVector(Vec<f64>);

impl IntensityVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, bucket: usize) -> Option<f64> {
        self.0.get(bucket).copied()
    }

    /// Index of the first bucket holding the maximum value, if any is non-zero
    pub fn peak_bucket(&self) -> Option<usize> {
        let mut peak: Option<usize> = None;
        for (i, &v) in self.0.iter().enumerate() {
            if v > 0.0 && peak.map_or(true, |p| v > self.0[p]) {
                peak = Some(i);
            }
        }
        peak
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Usage totals for one application across a batch of focus events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUsageStat {
    pub app_name: String,
    pub total_duration_seconds: f64,
    pub event_count: u64,
    pub is_code_editor: bool,
}
