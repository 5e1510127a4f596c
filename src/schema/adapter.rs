//! Adapter for converting backend records into domain types
//!
//! Parses JSON arrays or NDJSON batches, validates each record, and converts
//! the batch into the types consumed by segmentation and aggregation.

use serde::de::DeserializeOwned;

use crate::error::ComputeError;
use crate::schema::records::{
    DailySummaryRecord, SessionRecord, Validate, ValidationError, WindowEventRecord,
};
use crate::types::{DailyActivityStat, SessionSpan, WindowFocusEvent};

/// Adapter for backend record batches
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, ComputeError> {
        let records: Vec<T> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON), one record per line
    pub fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, ComputeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse either a JSON array or NDJSON, decided by the first character
    pub fn parse_auto<T: DeserializeOwned>(input: &str) -> Result<Vec<T>, ComputeError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate and convert window event records
    pub fn to_events(records: &[WindowEventRecord]) -> Result<Vec<WindowFocusEvent>, ComputeError> {
        check_all(records)?;
        Ok(records.iter().map(WindowEventRecord::to_event).collect())
    }

    /// Validate and convert daily summary records
    pub fn to_daily_stats(
        records: &[DailySummaryRecord],
    ) -> Result<Vec<DailyActivityStat>, ComputeError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record.validate().and_then(|_| record.to_stat()).map_err(|e| {
                    ComputeError::InvalidRecord {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    /// Validate and convert session records
    pub fn to_session_spans(records: &[SessionRecord]) -> Result<Vec<SessionSpan>, ComputeError> {
        check_all(records)?;
        Ok(records.iter().map(SessionRecord::to_span).collect())
    }

    /// Validate a batch, returning only the failures
    pub fn validate_records<R: Validate>(records: &[R]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index,
                    record: record.describe(),
                    error,
                })
            })
            .collect()
    }
}

/// A single failed record
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub index: usize,
    pub record: String,
    pub error: ValidationError,
}

/// Fail on the first invalid record
fn check_all<R: Validate>(records: &[R]) -> Result<(), ComputeError> {
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = record.validate() {
            log::warn!("rejecting batch: record {} ({}) invalid: {}", index, record.describe(), e);
            return Err(ComputeError::InvalidRecord {
                index,
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}
