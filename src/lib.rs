//! devpulse - Activity analytics core for a developer-activity dashboard
//!
//! devpulse turns the capture backend's raw batches into the structures the
//! dashboard renders: window focus events → work/break timeline segments,
//! daily summaries → per-day intensity, session spans → hour-of-day intensity.
//!
//! ## Modules
//!
//! - **Segmentation**: fold a session's focus events into deep-work, fragmented
//!   and break segments ([`segment`])
//! - **Heatmaps**: bucket and normalize activity into `[0, 1]` intensity
//!   vectors ([`heatmap`])
//! - **App usage**: per-app focus totals and coding time ([`app_usage`])

pub mod app_usage;
pub mod config;
pub mod encoder;
pub mod error;
pub mod heatmap;
pub mod pipeline;
pub mod schema;
pub mod segment;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::PulseConfig;
pub use error::ComputeError;
pub use pipeline::{
    app_usage_json, daily_heatmap_json, hourly_heatmap_json, segment_session_json,
    PulseProcessor,
};
pub use segment::{build_segments, SegmentBuilder};
pub use types::{ActivitySegment, IntensityVector, SegmentKind, TimelineSummary, WindowFocusEvent};

// Heatmap exports
pub use heatmap::{daily_intensity, hourly_intensity, normalize, HeatmapVariant};

/// devpulse version embedded in all payloads
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "devpulse";
