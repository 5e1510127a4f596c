//! Heatmap aggregation
//!
//! Turns per-day activity rows into fixed-length intensity vectors for
//! calendar and hour-of-day heatmaps. Every variant accumulates a raw measure
//! per bucket and then normalizes against the largest bucket, so the
//! rendering layer only maps values in [0, 1] to colors.
//!
//! - Daily: one bucket per calendar day in a window ending at a given date,
//!   oldest first, measured by the day's change count.
//! - Hourly: 24 hour-of-day buckets, measured in minutes of session time
//!   falling into each hour.

use std::collections::HashSet;

use chrono::{Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{DailyActivityStat, IntensityVector, SessionSpan};

/// Number of hour-of-day buckets
pub const HOURS_PER_DAY: usize = 24;

/// Longest daily window, about ten years; longer requests keep the most recent days
pub const MAX_WINDOW_DAYS: usize = 3660;

const MINUTE_MS: i64 = 60 * 1000;
const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Which bucketing an intensity vector was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapVariant {
    Daily,
    Hourly,
}

/// Accumulate weighted bucket hits for every row, then normalize.
///
/// `bucket_key` maps a row to zero or more `(bucket, weight)` pairs. Weights
/// for the same bucket add up. Buckets outside `0..bucket_count` are ignored.
pub fn aggregate<T, F, I>(rows: &[T], bucket_count: usize, mut bucket_key: F) -> IntensityVector
where
    F: FnMut(&T) -> I,
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut raw = vec![0.0; bucket_count];
    let mut dropped = 0usize;

    for row in rows {
        for (bucket, weight) in bucket_key(row) {
            match raw.get_mut(bucket) {
                Some(slot) => *slot += weight,
                None => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        log::warn!(
            "ignored {} bucket hits outside 0..{}",
            dropped,
            bucket_count
        );
    }

    normalize(&raw)
}

/// Divide every raw measure by the batch maximum.
///
/// The maximum is floored at 1 so an all-zero input stays all-zero instead of
/// dividing by zero. Results are clamped to [0, 1].
pub fn normalize(raw: &[f64]) -> IntensityVector {
    let max_raw = raw.iter().copied().fold(1.0_f64, f64::max);
    IntensityVector::from_values(
        raw.iter()
            .map(|&value| (value / max_raw).clamp(0.0, 1.0))
            .collect(),
    )
}

/// Daily intensity over the `days` calendar days ending at `end_date`
/// (inclusive), oldest first.
///
/// Each bucket is the change count of the row for that date, or 0 when no
/// row matches. If several rows share a date, the first one wins. Windows
/// longer than [`MAX_WINDOW_DAYS`] are cut to the most recent days.
pub fn daily_intensity(
    rows: &[DailyActivityStat],
    end_date: NaiveDate,
    days: usize,
) -> IntensityVector {
    let days = capped_window(days);
    let Some(first_day) = window_start(end_date, days) else {
        return IntensityVector::zeros(days);
    };

    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let vector = aggregate(rows, days, |row| {
        let offset = (row.date - first_day).num_days();
        if offset < 0 || offset >= days as i64 || !seen.insert(row.date) {
            return None;
        }
        Some((offset as usize, row.change_count as f64))
    });

    log::debug!(
        "daily intensity: {} rows into {} buckets ending {}",
        rows.len(),
        days,
        end_date
    );
    vector
}

/// Hour-of-day intensity from session spans.
///
/// Each span contributes the whole minutes it covers in every local hour it
/// touches: the tail of its starting hour, full hours in between, and the head
/// of its ending hour. Spans that cross midnight wrap onto the early buckets.
pub fn hourly_intensity(spans: &[SessionSpan], offset: FixedOffset) -> IntensityVector {
    let vector = aggregate(spans, HOURS_PER_DAY, |span| span_minutes_per_hour(span, offset));
    log::debug!("hourly intensity: {} sessions", spans.len());
    vector
}

/// Hour-of-day intensity over the sessions of all given days
pub fn hourly_intensity_for_days(
    rows: &[DailyActivityStat],
    offset: FixedOffset,
) -> IntensityVector {
    let spans: Vec<SessionSpan> = rows
        .iter()
        .flat_map(|row| row.sessions.iter().copied())
        .collect();
    hourly_intensity(&spans, offset)
}

/// ISO date labels for a daily window, oldest first
pub fn daily_labels(end_date: NaiveDate, days: usize) -> Vec<String> {
    let days = capped_window(days);
    match window_start(end_date, days) {
        Some(first_day) => (0..days as i64)
            .map(|i| (first_day + Duration::days(i)).format("%Y-%m-%d").to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// `"00:00"` .. `"23:00"`
pub fn hourly_labels() -> Vec<String> {
    (0..HOURS_PER_DAY).map(|h| format!("{h:02}:00")).collect()
}

fn capped_window(days: usize) -> usize {
    if days > MAX_WINDOW_DAYS {
        log::warn!("daily window of {} days cut to {}", days, MAX_WINDOW_DAYS);
    }
    days.min(MAX_WINDOW_DAYS)
}

fn window_start(end_date: NaiveDate, days: usize) -> Option<NaiveDate> {
    if days == 0 {
        return None;
    }
    end_date.checked_sub_signed(Duration::days(days as i64 - 1))
}

/// Minutes of `span` falling into each local hour-of-day bucket.
///
/// Every whole day in the span adds 60 minutes to each bucket, so only the
/// remainder (under 24 hours) is walked hour by hour.
fn span_minutes_per_hour(span: &SessionSpan, offset: FixedOffset) -> Vec<(usize, f64)> {
    let shift_ms = offset.local_minus_utc() as i64 * 1000;
    let start = span.start_time.saturating_add(shift_ms).div_euclid(MINUTE_MS);
    let end = span.end_time.saturating_add(shift_ms).div_euclid(MINUTE_MS);

    if end <= start {
        return Vec::new();
    }

    let full_days = (end - start) / MINUTES_PER_DAY;
    let rest_end = start + (end - start) % MINUTES_PER_DAY;

    let mut hits: Vec<(usize, f64)> = if full_days > 0 {
        (0..HOURS_PER_DAY)
            .map(|bucket| (bucket, (full_days * MINUTES_PER_HOUR) as f64))
            .collect()
    } else {
        Vec::new()
    };

    let first_hour = start.div_euclid(MINUTES_PER_HOUR);
    let last_hour = rest_end.div_euclid(MINUTES_PER_HOUR);
    hits.extend((first_hour..=last_hour).filter_map(|hour| {
        let lo = start.max(hour * MINUTES_PER_HOUR);
        let hi = rest_end.min((hour + 1) * MINUTES_PER_HOUR);
        (hi > lo).then(|| {
            let bucket = hour.rem_euclid(HOURS_PER_DAY as i64) as usize;
            (bucket, (hi - lo) as f64)
        })
    }));
    hits
}
