//! Batch-level properties of segmentation and heatmap aggregation, checked
//! over generated sessions.

use chrono::{FixedOffset, NaiveDate};
use pretty_assertions::assert_eq;

use devpulse::heatmap::{daily_labels, hourly_labels, HOURS_PER_DAY};
use devpulse::types::{DailyActivityStat, SessionSpan};
use devpulse::{
    build_segments, daily_heatmap_json, daily_intensity, hourly_intensity, ActivitySegment,
    SegmentKind, TimelineSummary, WindowFocusEvent,
};

const MINUTE: i64 = 60 * 1000;
const T0: i64 = 1_705_327_200_000;
const APPS: &[&str] = &["code.exe", "chrome.exe", "slack.exe", "terminal"];

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// A session with gaps ranging from back-to-back to half an hour
fn generated_session(seed: u64, len: usize) -> Vec<WindowFocusEvent> {
    let mut rng = Lcg(seed);
    let mut timestamp = T0;
    let mut events = Vec::with_capacity(len);
    for _ in 0..len {
        let app = APPS[rng.below(APPS.len() as u64) as usize];
        let duration = rng.below(240) as f64;
        events.push(WindowFocusEvent::new(timestamp, app, duration));
        timestamp += (duration as i64) * 1000 + rng.below(30) as i64 * MINUTE + 1;
    }
    events
}

/// Like [`generated_session`], but samples may share a start or begin
/// before the previous one ends
fn generated_noisy_session(seed: u64, len: usize) -> Vec<WindowFocusEvent> {
    let mut rng = Lcg(seed);
    let mut timestamp = T0;
    let mut events = Vec::with_capacity(len);
    for _ in 0..len {
        let app = APPS[rng.below(APPS.len() as u64) as usize];
        let duration = rng.below(240) as f64;
        events.push(WindowFocusEvent::new(timestamp, app, duration));
        timestamp += match rng.below(4) {
            // tied start
            0 => 0,
            // starts halfway through the previous sample
            1 => (duration as i64) * 500,
            _ => (duration as i64) * 1000 + rng.below(30) as i64 * MINUTE + 1,
        };
    }
    events
}

fn sorted_events(mut events: Vec<WindowFocusEvent>) -> Vec<WindowFocusEvent> {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.app_name.cmp(&b.app_name))
            .then_with(|| a.duration_seconds.total_cmp(&b.duration_seconds))
    });
    events
}

/// Deterministic shuffle
fn shuffled(events: &[WindowFocusEvent], seed: u64) -> Vec<WindowFocusEvent> {
    let mut rng = Lcg(seed);
    let mut out = events.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.below(i as u64 + 1) as usize;
        out.swap(i, j);
    }
    out
}

#[test]
fn segments_are_ordered_and_disjoint() {
    for seed in 0..50 {
        let segments = build_segments(&generated_noisy_session(seed, 40));
        for pair in segments.windows(2) {
            assert!(
                pair[0].end_time() <= pair[1].start_time(),
                "seed {}: {:?} overlaps {:?}",
                seed,
                pair[0].kind(),
                pair[1].kind()
            );
        }
        assert!(segments.iter().all(|s| s.start_time() <= s.end_time()));
    }
}

#[test]
fn every_event_lands_in_exactly_one_work_segment() {
    for seed in 0..50 {
        let events = generated_noisy_session(seed, 40);
        let segments = build_segments(&shuffled(&events, seed + 1000));

        let collected: Vec<WindowFocusEvent> = segments
            .iter()
            .filter(|s| !s.is_break())
            .flat_map(|s| s.events().iter().cloned())
            .collect();

        assert_eq!(sorted_events(collected), sorted_events(events), "seed {}", seed);
    }
}

#[test]
fn building_is_idempotent_across_input_orders() {
    for seed in 0..20 {
        let events = generated_session(seed, 30);
        let expected = build_segments(&events);
        assert_eq!(build_segments(&events), expected);
        assert_eq!(build_segments(&shuffled(&events, seed)), expected);

        let mut reversed = events.clone();
        reversed.reverse();
        assert_eq!(build_segments(&reversed), expected);
    }
}

#[test]
fn breaks_sit_between_work_segments_and_match_the_gap() {
    for seed in 0..50 {
        let segments = build_segments(&generated_noisy_session(seed, 40));
        for (i, segment) in segments.iter().enumerate() {
            if let ActivitySegment::Break(gap) = segment {
                assert!(i > 0 && i + 1 < segments.len());
                assert!(!segments[i - 1].is_break() && !segments[i + 1].is_break());
                assert!(gap.end_time - gap.start_time > 10 * MINUTE);
                assert_eq!(
                    gap.total_duration_seconds,
                    (gap.end_time - gap.start_time) as f64 / 1000.0
                );
            }
        }
    }
}

#[test]
fn classification_follows_switch_count() {
    for seed in 0..50 {
        for segment in build_segments(&generated_noisy_session(seed, 60)) {
            match segment.kind() {
                SegmentKind::Fragmented => assert!(segment.switch_count() > 8),
                SegmentKind::DeepWork => assert!(segment.switch_count() <= 8),
                SegmentKind::Break => assert_eq!(segment.switch_count(), 0),
            }
        }
    }
}

#[test]
fn ten_alternating_events_are_fragmented() {
    let events: Vec<WindowFocusEvent> = (0..10)
        .map(|i| {
            let app = if i % 2 == 0 { "code.exe" } else { "chrome.exe" };
            WindowFocusEvent::new(T0 + i * MINUTE, app, 30.0)
        })
        .collect();

    let segments = build_segments(&events);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind(), SegmentKind::Fragmented);
    assert_eq!(segments[0].switch_count(), 9);

    let summary = TimelineSummary::from_segments(&segments);
    assert_eq!(summary.fragmented_seconds, 300.0);
    assert_eq!(summary.focus_ratio, 0.0);
}

#[test]
fn intensity_values_stay_in_unit_range() {
    let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    for seed in 0..30 {
        let mut rng = Lcg(seed);
        let rows: Vec<DailyActivityStat> = (0..40)
            .map(|i| DailyActivityStat {
                date: end - chrono::Duration::days(i),
                change_count: rng.below(500) as u32,
                sessions: Vec::new(),
            })
            .collect();

        let vector = daily_intensity(&rows, end, 30);
        assert_eq!(vector.len(), 30);
        assert!(vector.values().iter().all(|v| (0.0..=1.0).contains(v)));

        let in_window = &rows[..30];
        if let Some(peak_row) = in_window.iter().max_by_key(|r| r.change_count) {
            if peak_row.change_count > 0 {
                let bucket = 29 - (end - peak_row.date).num_days() as usize;
                assert_eq!(vector.get(bucket), Some(1.0));
            }
        }
    }
}

#[test]
fn hourly_peak_is_exactly_one() {
    let utc = FixedOffset::east_opt(0).unwrap();
    for seed in 0..30 {
        let mut rng = Lcg(seed);
        let spans: Vec<SessionSpan> = (0..10)
            .map(|_| {
                let start = T0 + rng.below(24 * 60) as i64 * MINUTE;
                SessionSpan {
                    start_time: start,
                    end_time: start + rng.below(180) as i64 * MINUTE,
                }
            })
            .collect();

        let vector = hourly_intensity(&spans, utc);
        assert_eq!(vector.len(), HOURS_PER_DAY);
        assert!(vector.values().iter().all(|v| (0.0..=1.0).contains(v)));
        if vector.values().iter().any(|&v| v > 0.0) {
            let max = vector.values().iter().copied().fold(0.0, f64::max);
            assert_eq!(max, 1.0);
        }
    }
}

#[test]
fn all_zero_input_yields_zero_vector() {
    let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
    let rows: Vec<DailyActivityStat> = (0..7)
        .map(|i| DailyActivityStat {
            date: end - chrono::Duration::days(i),
            change_count: 0,
            sessions: Vec::new(),
        })
        .collect();
    assert_eq!(daily_intensity(&rows, end, 7).values(), &[0.0; 7]);

    let utc = FixedOffset::east_opt(0).unwrap();
    assert_eq!(hourly_intensity(&[], utc).values(), &[0.0; HOURS_PER_DAY]);
}

#[test]
fn two_day_window_matches_reference_values() {
    let rows = r#"[
        { "date": "2024-01-01", "total_diffs": 10 },
        { "date": "2024-01-02", "total_diffs": 5 }
    ]"#;
    let payload: serde_json::Value =
        serde_json::from_str(&daily_heatmap_json(rows, "2024-01-02", 2).unwrap()).unwrap();
    assert_eq!(payload["values"], serde_json::json!([1.0, 0.5]));
}

#[test]
fn labels_line_up_with_buckets() {
    let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let labels = daily_labels(end, 3);
    assert_eq!(labels, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
    assert_eq!(hourly_labels().len(), HOURS_PER_DAY);
}
