//! Pipeline orchestration
//!
//! JSON-in / JSON-out entry points used by the dashboard shell, the FFI layer
//! and the CLI. Each call parses a backend batch, validates it, runs the
//! segmentation or aggregation stage, and encodes the result.

use chrono::NaiveDate;

use crate::app_usage::{coding_minutes, compute_app_stats, top_app_stats};
use crate::config::{check_window_days, utc_offset, PulseConfig};
use crate::encoder::{
    to_json, AppUsagePayload, HeatmapPayload, PayloadEncoder, TimelinePayload,
};
use crate::error::ComputeError;
use crate::heatmap::{
    daily_intensity, daily_labels, hourly_intensity, hourly_intensity_for_days, hourly_labels,
    HeatmapVariant,
};
use crate::schema::{
    DailySummaryRecord, RecordAdapter, SessionRecord, WindowEventRecord, DATE_FORMAT,
};
use crate::segment::SegmentBuilder;

/// Segment one session's window events (JSON array or NDJSON) into a timeline.
///
/// # Example
/// ```ignore
/// let timeline_json = segment_session_json(events_json)?;
/// ```
pub fn segment_session_json(events_json: &str) -> Result<String, ComputeError> {
    let encoder = PayloadEncoder::new();
    let payload = segment_session(&encoder, events_json)?;
    to_json(&payload, false)
}

/// Daily intensity for the `days` days ending at `end_date` (`YYYY-MM-DD`).
pub fn daily_heatmap_json(
    summaries_json: &str,
    end_date: &str,
    days: usize,
) -> Result<String, ComputeError> {
    let encoder = PayloadEncoder::new();
    let payload = daily_heatmap(&encoder, summaries_json, parse_end_date(end_date)?, days)?;
    to_json(&payload, false)
}

/// Hour-of-day intensity from session records, bucketed at the given offset.
///
/// The input may be session records (`start_time`/`end_time`) or daily
/// summaries carrying `sessions`.
pub fn hourly_heatmap_json(
    sessions_json: &str,
    utc_offset_minutes: i32,
) -> Result<String, ComputeError> {
    let encoder = PayloadEncoder::new();
    let payload = hourly_heatmap(&encoder, sessions_json, utc_offset_minutes)?;
    to_json(&payload, false)
}

/// Per-app usage breakdown of window events, truncated to `limit` (0 keeps all)
pub fn app_usage_json(events_json: &str, limit: usize) -> Result<String, ComputeError> {
    let encoder = PayloadEncoder::new();
    let payload = app_usage(&encoder, events_json, limit)?;
    to_json(&payload, false)
}

/// Processor carrying configuration and a stable encoder identity across calls.
pub struct PulseProcessor {
    config: PulseConfig,
    encoder: PayloadEncoder,
}

impl Default for PulseProcessor {
    fn default() -> Self {
        Self {
            config: PulseConfig::default(),
            encoder: PayloadEncoder::new(),
        }
    }
}

impl PulseProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: PulseConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: PayloadEncoder::new(),
        })
    }

    /// Create a processor from a JSON configuration
    pub fn from_config_json(json: &str) -> Result<Self, ComputeError> {
        Self::new(PulseConfig::from_json(json)?)
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    pub fn segment_session(&self, events_json: &str) -> Result<TimelinePayload, ComputeError> {
        segment_session(&self.encoder, events_json)
    }

    /// Daily heatmap over the configured window ending at `end_date`
    pub fn daily_heatmap(
        &self,
        summaries_json: &str,
        end_date: NaiveDate,
    ) -> Result<HeatmapPayload, ComputeError> {
        daily_heatmap(
            &self.encoder,
            summaries_json,
            end_date,
            self.config.daily_window_days,
        )
    }

    /// Hourly heatmap at the configured UTC offset
    pub fn hourly_heatmap(&self, sessions_json: &str) -> Result<HeatmapPayload, ComputeError> {
        hourly_heatmap(&self.encoder, sessions_json, self.config.utc_offset_minutes)
    }

    /// App usage truncated to the configured limit
    pub fn app_usage(&self, events_json: &str) -> Result<AppUsagePayload, ComputeError> {
        app_usage(&self.encoder, events_json, self.config.top_apps_limit)
    }
}

fn segment_session(
    encoder: &PayloadEncoder,
    events_json: &str,
) -> Result<TimelinePayload, ComputeError> {
    let records: Vec<WindowEventRecord> = RecordAdapter::parse_auto(events_json)?;
    let events = RecordAdapter::to_events(&records)?;
    let segments = SegmentBuilder::build(&events);
    Ok(encoder.encode_timeline(segments))
}

fn daily_heatmap(
    encoder: &PayloadEncoder,
    summaries_json: &str,
    end_date: NaiveDate,
    days: usize,
) -> Result<HeatmapPayload, ComputeError> {
    check_window_days(days)?;
    let records: Vec<DailySummaryRecord> = RecordAdapter::parse_auto(summaries_json)?;
    let stats = RecordAdapter::to_daily_stats(&records)?;
    let values = daily_intensity(&stats, end_date, days);
    encoder.encode_heatmap(HeatmapVariant::Daily, daily_labels(end_date, days), values)
}

fn hourly_heatmap(
    encoder: &PayloadEncoder,
    sessions_json: &str,
    utc_offset_minutes: i32,
) -> Result<HeatmapPayload, ComputeError> {
    let offset = utc_offset(utc_offset_minutes)?;
    let values = match RecordAdapter::parse_auto::<SessionRecord>(sessions_json) {
        Ok(records) => hourly_intensity(&RecordAdapter::to_session_spans(&records)?, offset),
        Err(session_err) => {
            // not bare sessions; accept daily summaries carrying them
            let summaries: Vec<DailySummaryRecord> =
                RecordAdapter::parse_auto(sessions_json).map_err(|_| session_err)?;
            let stats = RecordAdapter::to_daily_stats(&summaries)?;
            hourly_intensity_for_days(&stats, offset)
        }
    };
    encoder.encode_heatmap(HeatmapVariant::Hourly, hourly_labels(), values)
}

fn app_usage(
    encoder: &PayloadEncoder,
    events_json: &str,
    limit: usize,
) -> Result<AppUsagePayload, ComputeError> {
    let records: Vec<WindowEventRecord> = RecordAdapter::parse_auto(events_json)?;
    let events = RecordAdapter::to_events(&records)?;
    let stats = compute_app_stats(&events);
    // coding minutes cover every app, not just the ones shown
    let minutes = coding_minutes(&stats);
    let shown = top_app_stats(&stats, limit).to_vec();
    Ok(encoder.encode_app_usage(shown, minutes))
}

/// Parse a `YYYY-MM-DD` window end date
pub fn parse_end_date(end_date: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(end_date.trim(), DATE_FORMAT)
        .map_err(|e| ComputeError::DateParseError(format!("{}: {}", end_date, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events_json() -> &'static str {
        r#"[
            { "timestamp": 1705327200000, "app_name": "code.exe", "title": "builder.rs", "duration": 240 },
            { "timestamp": 1705327440000, "app_name": "chrome.exe", "title": "docs.rs", "duration": 60 },
            { "timestamp": 1705327500000, "app_name": "code.exe", "title": "builder.rs", "duration": 600 },
            { "timestamp": 1705329000000, "app_name": "code.exe", "title": "heatmap.rs", "duration": 300 }
        ]"#
    }

    #[test]
    fn test_segment_session_json() {
        let json = segment_session_json(sample_events_json()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        let segments = payload["segments"].as_array().unwrap();
        // 14:00-14:15 work, 15 minute gap becomes a break, 14:30 work
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0]["kind"], "deep_work");
        assert_eq!(segments[0]["switch_count"], 2);
        assert_eq!(segments[0]["primary_app"], "code.exe");
        assert_eq!(segments[1]["kind"], "break");
        assert_eq!(segments[1]["total_duration_seconds"], 900.0);
        assert_eq!(segments[2]["kind"], "deep_work");
        assert_eq!(payload["summary"]["segment_count"], 3);
    }

    #[test]
    fn test_segment_session_empty_batch() {
        let json = segment_session_json("[]").unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(payload["segments"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_segment_session_invalid_json() {
        assert!(segment_session_json("not valid json").is_err());
    }

    #[test]
    fn test_daily_heatmap_json() {
        let rows = r#"[
            { "date": "2024-01-01", "total_diffs": 10 },
            { "date": "2024-01-02", "total_diffs": 5 }
        ]"#;
        let json = daily_heatmap_json(rows, "2024-01-02", 2).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["variant"], "daily");
        assert_eq!(payload["values"], serde_json::json!([1.0, 0.5]));
        assert_eq!(payload["labels"], serde_json::json!(["2024-01-01", "2024-01-02"]));
    }

    #[test]
    fn test_daily_heatmap_bad_end_date() {
        let result = daily_heatmap_json("[]", "Jan 2", 7);
        assert!(matches!(result, Err(ComputeError::DateParseError(_))));
    }

    #[test]
    fn test_daily_heatmap_rejects_oversized_window() {
        let result = daily_heatmap_json("[]", "2024-01-02", 200_000_000_000_000);
        assert!(matches!(result, Err(ComputeError::InvalidConfig(_))));
        assert!(matches!(
            daily_heatmap_json("[]", "2024-01-02", 0),
            Err(ComputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hourly_heatmap_extreme_offset() {
        let result = hourly_heatmap_json("[]", i32::MIN);
        assert!(matches!(result, Err(ComputeError::InvalidConfig(_))));
    }

    #[test]
    fn test_hourly_heatmap_unbounded_session() {
        let sessions = r#"[{ "start_time": 0, "end_time": 9223372036854775807 }]"#;
        let json = hourly_heatmap_json(sessions, 60).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        let values = payload["values"].as_array().unwrap();
        assert_eq!(values.len(), 24);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(&v.as_f64().unwrap())));
    }

    #[test]
    fn test_segment_session_huge_duration_rejected() {
        let events = r#"[{ "timestamp": 1705327200000, "app_name": "code.exe", "duration": 1e300 }]"#;
        let result = segment_session_json(events);
        assert!(matches!(result, Err(ComputeError::InvalidRecord { index: 0, .. })));
    }

    #[test]
    fn test_hourly_heatmap_from_sessions() {
        // 2024-01-15 14:00-14:30 UTC
        let sessions = r#"[{ "start_time": 1705327200000, "end_time": 1705329000000 }]"#;
        let json = hourly_heatmap_json(sessions, 0).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["variant"], "hourly");
        assert_eq!(payload["values"].as_array().unwrap().len(), 24);
        assert_eq!(payload["values"][14], 1.0);
        assert_eq!(payload["labels"][14], "14:00");
    }

    #[test]
    fn test_hourly_heatmap_from_daily_summaries() {
        let rows = r#"[{
            "date": "2024-01-15",
            "total_diffs": 3,
            "sessions": [{ "start_time": 1705327200000, "end_time": 1705329000000 }]
        }]"#;
        let json = hourly_heatmap_json(rows, 60).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["values"][15], 1.0);
    }

    #[test]
    fn test_hourly_heatmap_bad_offset() {
        assert!(hourly_heatmap_json("[]", 100_000).is_err());
    }

    #[test]
    fn test_app_usage_json() {
        let json = app_usage_json(sample_events_json(), 1).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        let apps = payload["apps"].as_array().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0]["app_name"], "code.exe");
        assert_eq!(apps[0]["event_count"], 3);
        // 240 + 600 + 300 seconds in code.exe
        assert_eq!(payload["coding_minutes"], 19);
    }

    #[test]
    fn test_processor_uses_config() {
        let processor = PulseProcessor::from_config_json(
            r#"{ "utc_offset_minutes": 120, "daily_window_days": 3, "top_apps_limit": 0 }"#,
        )
        .unwrap();

        let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let daily = processor
            .daily_heatmap(r#"[{ "date": "2024-01-02", "total_diffs": 4 }]"#, end)
            .unwrap();
        assert_eq!(daily.values.values(), &[0.0, 0.0, 1.0]);

        let hourly = processor
            .hourly_heatmap(r#"[{ "start_time": 1705327200000, "end_time": 1705329000000 }]"#)
            .unwrap();
        assert_eq!(hourly.values.get(16), Some(1.0));

        let usage = processor.app_usage(sample_events_json()).unwrap();
        assert_eq!(usage.apps.len(), 2);
    }

    #[test]
    fn test_processor_keeps_instance_id() {
        let processor = PulseProcessor::default();
        let a = processor.segment_session(sample_events_json()).unwrap();
        let b = processor.segment_session(sample_events_json()).unwrap();
        assert_eq!(a.producer.instance_id, b.producer.instance_id);
        assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        let config = PulseConfig {
            daily_window_days: 0,
            ..Default::default()
        };
        assert!(PulseProcessor::new(config).is_err());
    }
}
