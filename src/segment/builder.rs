//! Segment builder
//!
//! Sorts a session's focus events and folds them into work segments. A gap
//! longer than [`FOLD_GAP_MS`] closes the open segment; a gap longer than
//! [`BREAK_GAP_MS`] additionally inserts a break covering the gap. Closed work
//! segments are classified by their switch count.

use crate::segment::accumulator::AppDurationTally;
use crate::types::{ActivitySegment, BreakSpan, WindowFocusEvent, WorkSpan};

/// Gaps up to this length (5 minutes) fold into the open segment
pub const FOLD_GAP_MS: i64 = 5 * 60 * 1000;

/// Gaps longer than this (10 minutes) are recorded as a break
pub const BREAK_GAP_MS: i64 = 10 * 60 * 1000;

/// Work segments with more app switches than this are fragmented
pub const FRAGMENTED_SWITCH_THRESHOLD: u32 = 8;

/// Builds a classified timeline from one session's focus events.
pub struct SegmentBuilder;

impl SegmentBuilder {
    /// Build segments from a batch of events in any order.
    ///
    /// The result is ordered by start time and never overlapping. An empty
    /// batch yields an empty timeline.
    pub fn build(events: &[WindowFocusEvent]) -> Vec<ActivitySegment> {
        let mut sorted: Vec<&WindowFocusEvent> = events.iter().collect();
        // stable: equal timestamps keep their input order
        sorted.sort_by_key(|e| e.timestamp);

        let mut segments = Vec::new();
        let mut open: Option<OpenSegment> = None;
        let mut overlaps = 0usize;

        for event in sorted {
            let Some(mut current) = open.take() else {
                open = Some(OpenSegment::seed(event));
                continue;
            };

            let raw_gap = event.timestamp.saturating_sub(current.end_time);
            if raw_gap < 0 {
                overlaps += 1;
            }
            let gap = raw_gap.max(0);
            if gap > FOLD_GAP_MS {
                let gap_start = current.end_time;
                segments.push(current.finish());
                if gap > BREAK_GAP_MS {
                    segments.push(ActivitySegment::Break(BreakSpan {
                        start_time: gap_start,
                        end_time: event.timestamp,
                        total_duration_seconds: gap as f64 / 1000.0,
                    }));
                }
                open = Some(OpenSegment::seed(event));
            } else {
                current.fold(event);
                open = Some(current);
            }
        }

        if let Some(current) = open {
            segments.push(current.finish());
        }

        if overlaps > 0 {
            log::warn!("clamped {} overlapping focus samples to a zero gap", overlaps);
        }
        log::debug!(
            "built {} segments from {} focus events",
            segments.len(),
            events.len()
        );

        segments
    }
}

/// Convenience wrapper around [`SegmentBuilder::build`]
pub fn build_segments(events: &[WindowFocusEvent]) -> Vec<ActivitySegment> {
    SegmentBuilder::build(events)
}

/// Running state of the segment currently being folded
struct OpenSegment {
    start_time: i64,
    end_time: i64,
    events: Vec<WindowFocusEvent>,
    tally: AppDurationTally,
    switch_count: u32,
    total_duration_seconds: f64,
}

impl OpenSegment {
    fn seed(event: &WindowFocusEvent) -> Self {
        let mut tally = AppDurationTally::new();
        tally.add(&event.app_name, event.duration_seconds);
        Self {
            start_time: event.timestamp,
            end_time: event.end_time().max(event.timestamp),
            events: vec![event.clone()],
            tally,
            switch_count: 0,
            total_duration_seconds: event.duration_seconds,
        }
    }

    fn fold(&mut self, event: &WindowFocusEvent) {
        let switched = self
            .events
            .last()
            .is_some_and(|prev| prev.app_name != event.app_name);
        if switched {
            self.switch_count += 1;
        }

        self.end_time = self.end_time.max(event.end_time());
        self.total_duration_seconds += event.duration_seconds;
        self.tally.add(&event.app_name, event.duration_seconds);
        self.events.push(event.clone());
    }

    fn finish(self) -> ActivitySegment {
        let span = WorkSpan {
            start_time: self.start_time,
            end_time: self.end_time,
            primary_app: self.tally.leader().unwrap_or_default().to_string(),
            events: self.events,
            switch_count: self.switch_count,
            total_duration_seconds: self.total_duration_seconds,
        };

        if span.switch_count > FRAGMENTED_SWITCH_THRESHOLD {
            ActivitySegment::Fragmented(span)
        } else {
            ActivitySegment::DeepWork(span)
        }
    }
}
