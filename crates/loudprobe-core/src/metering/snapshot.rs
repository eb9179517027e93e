//! Metrics snapshot emitted once per processed block.

use super::{LoudnessReadings, StereoPpm, StereoReading, TruePeakReading};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Version of the [`MetricsSnapshot`] shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Elapsed capture time before each loudness field is presentation-ready.
pub const MOMENTARY_READY_SECS: f64 = 1.0;
pub const SHORT_TERM_READY_SECS: f64 = 10.0;
pub const INTEGRATED_READY_SECS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds of audio processed since the last reset, at the end of this block.
    pub capture_time_secs: f64,
    /// Wall clock when the snapshot was assembled, milliseconds since the Unix epoch.
    pub wall_clock_ms: u64,
    pub sequence: u64,
}

/// Presentation readiness per loudness field. Values are reported regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Readiness {
    pub momentary: bool,
    pub short_term: bool,
    pub integrated: bool,
    pub range: bool,
}

impl Readiness {
    pub fn at(elapsed_secs: f64) -> Self {
        Self {
            momentary: elapsed_secs >= MOMENTARY_READY_SECS,
            short_term: elapsed_secs >= SHORT_TERM_READY_SECS,
            integrated: elapsed_secs >= INTEGRATED_READY_SECS,
            range: elapsed_secs >= INTEGRATED_READY_SECS,
        }
    }
}

/// Immutable per-block measurement result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub schema_version: u32,
    pub probe: String,
    pub timestamp: Timestamp,
    pub lufs: LoudnessReadings,
    pub true_peak: TruePeakReading,
    pub ppm: StereoPpm,
    pub stereo: StereoReading,
    pub readiness: Readiness,
    pub is_active: bool,
}

impl MetricsSnapshot {
    /// Reject snapshots built against a different schema.
    pub fn check_schema(&self, expected: u32) -> Result<()> {
        if self.schema_version == expected {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                expected,
                actual: self.schema_version,
            })
        }
    }
}
