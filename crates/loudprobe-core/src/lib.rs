//! Broadcast metering engine: K-weighted loudness, true-peak, PPM and stereo analysis.
//!
//! # Primary API
//!
//! - [`MeteringEngine`]: owns every detector; one [`MetricsSnapshot`] per block
//! - [`MeterConfig`]: sample rate, block size, PPM model, sanitisation policy
//! - [`MeterObserver`]: anomaly hook (non-finite input, reduced accuracy, sequence gaps)
//! - [`analyze_loudness`]: offline two-pass reference measurement
//!
//! # Example
//!
//! ```ignore
//! use loudprobe_core::{MeterConfig, MeteringEngine, SampleBlock};
//!
//! let mut engine = MeteringEngine::new(MeterConfig::new(48000.0, 480))?;
//! let snapshot = engine.process(&SampleBlock::new(&left, &right, 48000.0))?;
//! println!("{:.1} LUFS", snapshot.lufs.momentary);
//! ```

pub mod config;
pub mod error;
pub mod lockfree;
pub mod metering;

pub use config::{MeterConfig, NonFinitePolicy};
pub use error::{Error, Result};
pub use lockfree::{AtomicCounter, AtomicFlag};
pub use metering::{
    analyze_loudness, CoefficientMode, LoudnessReadings, LoudnessResult, MeterObserver,
    MeteringContext, MeteringEngine, MetricsSnapshot, NoopObserver, PpmModel, PpmReading,
    Readiness, SampleBlock, StereoPpm, StereoReading, Timestamp, TracingObserver,
    TruePeakReading, SCHEMA_VERSION,
};
