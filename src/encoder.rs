//! Output encoding
//!
//! Wraps timelines, intensity vectors and usage breakdowns in envelopes that
//! carry producer metadata, ready to hand to the rendering layer as JSON.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ComputeError;
use crate::heatmap::HeatmapVariant;
use crate::types::{ActivitySegment, AppUsageStat, IntensityVector, TimelineSummary};
use crate::{PRODUCER_NAME, PULSE_VERSION};

/// Current output envelope version
pub const PAYLOAD_VERSION: &str = "devpulse.v1";

/// Who produced a payload and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
    pub computed_at_utc: String,
}

/// A session timeline with its summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePayload {
    pub payload_version: String,
    pub producer: PayloadProducer,
    pub segments: Vec<ActivitySegment>,
    pub summary: TimelineSummary,
}

/// An intensity vector with one label per bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapPayload {
    pub payload_version: String,
    pub producer: PayloadProducer,
    pub variant: HeatmapVariant,
    pub labels: Vec<String>,
    pub values: IntensityVector,
}

/// Per-app usage breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUsagePayload {
    pub payload_version: String,
    pub producer: PayloadProducer,
    pub apps: Vec<AppUsageStat>,
    pub coding_minutes: i64,
}

/// Encoder for output envelopes
pub struct PayloadEncoder {
    instance_id: String,
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode_timeline(&self, segments: Vec<ActivitySegment>) -> TimelinePayload {
        let summary = TimelineSummary::from_segments(&segments);
        TimelinePayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: self.producer(),
            segments,
            summary,
        }
    }

    pub fn encode_heatmap(
        &self,
        variant: HeatmapVariant,
        labels: Vec<String>,
        values: IntensityVector,
    ) -> Result<HeatmapPayload, ComputeError> {
        if labels.len() != values.len() {
            return Err(ComputeError::EncodingError(format!(
                "{} labels for {} buckets",
                labels.len(),
                values.len()
            )));
        }
        Ok(HeatmapPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: self.producer(),
            variant,
            labels,
            values,
        })
    }

    pub fn encode_app_usage(&self, apps: Vec<AppUsageStat>, coding_minutes: i64) -> AppUsagePayload {
        AppUsagePayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: self.producer(),
            apps,
            coding_minutes,
        }
    }

    fn producer(&self) -> PayloadProducer {
        PayloadProducer {
            name: PRODUCER_NAME.to_string(),
            version: PULSE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
        }
    }
}

/// Serialize a payload, pretty-printed or compact
pub fn to_json<T: Serialize>(payload: &T, pretty: bool) -> Result<String, ComputeError> {
    let json = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    json.map_err(ComputeError::JsonError)
}
