//! Timeline summary
//!
//! Per-kind totals over a built timeline, so the dashboard can show how a
//! session split between deep work, fragmented switching and breaks.

use crate::types::{ActivitySegment, TimelineSummary};

impl TimelineSummary {
    /// Summarize a timeline produced by the segment builder
    pub fn from_segments(segments: &[ActivitySegment]) -> Self {
        let mut summary = TimelineSummary {
            segment_count: segments.len() as u32,
            ..Default::default()
        };

        for segment in segments {
            let seconds = segment.total_duration_seconds();
            match segment {
                ActivitySegment::DeepWork(span) => {
                    summary.deep_work_seconds += seconds;
                    summary.total_switches += span.switch_count;
                    summary.longest_deep_work_seconds =
                        summary.longest_deep_work_seconds.max(seconds);
                }
                ActivitySegment::Fragmented(span) => {
                    summary.fragmented_seconds += seconds;
                    summary.total_switches += span.switch_count;
                }
                ActivitySegment::Break(_) => summary.break_seconds += seconds,
            }
        }

        summary.focus_ratio =
            compute_focus_ratio(summary.deep_work_seconds, summary.fragmented_seconds);
        summary
    }
}

/// Share of work time spent in deep work (0-1)
fn compute_focus_ratio(deep_work_seconds: f64, fragmented_seconds: f64) -> f64 {
    let work = deep_work_seconds + fragmented_seconds;
    if work <= 0.0 {
        return 0.0;
    }
    (deep_work_seconds / work).clamp(0.0, 1.0)
}
