//! Activity segmentation
//!
//! Folds a session's window-focus events into an ordered timeline of
//! deep-work, fragmented and break segments.
//!
//! Pipeline: focus events → sort → fold (accumulator) → classify → timeline

pub mod accumulator;
pub mod builder;
pub mod summary;

pub use accumulator::AppDurationTally;
pub use builder::{
    build_segments, SegmentBuilder, BREAK_GAP_MS, FOLD_GAP_MS, FRAGMENTED_SWITCH_THRESHOLD,
};
