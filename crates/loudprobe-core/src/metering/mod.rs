//! Broadcast metering.
//!
//! - Streaming: `MeteringEngine` turns fixed-size stereo blocks into `MetricsSnapshot`s
//! - Offline: `analyze_loudness` for a whole-programme two-pass reference

mod engine;
mod kweighting;
mod loudness;
pub mod math;
mod observer;
mod ppm;
mod reference;
mod rt;
mod snapshot;
mod stereo;
mod true_peak;

pub use engine::{MeteringEngine, SampleBlock};
pub use kweighting::{
    Biquad, BiquadCoeffs, CoefficientMode, KWeightingFilter, StereoKWeighting,
    REFERENCE_SAMPLE_RATE,
};
pub use loudness::{
    LoudnessAccumulator, LoudnessReadings, ABSOLUTE_GATE_LUFS, LRA_HIGH_PERCENTILE,
    LRA_LOW_PERCENTILE, LRA_MIN_ENTRIES, LRA_RELATIVE_GATE_LU, MOMENTARY_WINDOW_SECS,
    RELATIVE_GATE_LU, SHORT_TERM_WINDOW_SECS,
};
pub use observer::{MeterObserver, NoopObserver, TracingObserver};
pub use ppm::{
    dbfs_to_ppm, ppm_to_dbfs, PpmBallistics, PpmChannel, PpmMeter, PpmModel, PpmReading,
    RcDetector, StereoPpm, WindowDetector, DISPLAY_CEILING_DBFS, DISPLAY_FLOOR_DBFS,
    PEAK_HOLD_SECS, PPM_OFFSET_DB,
};
pub use reference::{analyze_loudness, LoudnessResult, CHANNEL_SUM_OFFSET_DB};
pub use rt::MeteringContext;
pub use snapshot::{
    MetricsSnapshot, Readiness, Timestamp, INTEGRATED_READY_SECS, MOMENTARY_READY_SECS,
    SCHEMA_VERSION, SHORT_TERM_READY_SECS,
};
pub use stereo::{analyze_stereo, StereoAnalyzer, StereoReading};
pub use true_peak::{channel_true_peak, hermite, TruePeakDetector, TruePeakReading};
