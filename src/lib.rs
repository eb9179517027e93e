//! # loudprobe - Broadcast Loudness and Level Metering
//!
//! Live EBU R128 / ITU-R BS.1770 loudness, true-peak, PPM and stereo metering
//! for broadcast probes.
//!
//! ## Architecture
//!
//! loudprobe is an umbrella crate that coordinates:
//! - **loudprobe-core** - Metering engine (K-weighting, LUFS, true-peak, PPM, stereo)
//! - **loudprobe-live** - Metering thread, capture-thread meter, lock-free snapshot handle
//!
//! ## Quick Start
//!
//! ```ignore
//! use loudprobe::prelude::*;
//!
//! let probe = Probe::builder()
//!     .sample_rate(48000.0)
//!     .probe("studio-a")
//!     .build()?;
//!
//! let mut input = probe.take_input().unwrap();
//! input.push_interleaved(&capture_buffer);
//!
//! if let Some(snapshot) = probe.latest() {
//!     println!("M {:.1} LUFS, TP {:.1} dBTP", snapshot.lufs.momentary, snapshot.true_peak.max);
//! }
//! ```
//!
//! For blocking, single-threaded use drive a [`MeteringEngine`] directly.

/// Re-export of loudprobe-core for direct access
pub use loudprobe_core as core;

/// Re-export of loudprobe-live for direct access
pub use loudprobe_live as live;

pub use loudprobe_core::{
    analyze_loudness, CoefficientMode, LoudnessReadings, LoudnessResult, MeterConfig,
    MeterObserver, MeteringContext, MeteringEngine, MetricsSnapshot, NonFinitePolicy,
    NoopObserver, PpmModel, PpmReading, Readiness, SampleBlock, StereoPpm, StereoReading,
    Timestamp, TracingObserver, TruePeakReading, SCHEMA_VERSION,
};
pub use loudprobe_live::{CaptureMeter, LiveConfig, MeterCommand, MeterHandle};

mod builder;
mod engine;
mod error;

pub use builder::ProbeBuilder;
pub use engine::{CaptureInput, Probe};
pub use error::{Error, Result};

pub mod prelude {
    pub use crate::{
        CaptureInput, Error, MeterConfig, MeterHandle, MeteringEngine, MetricsSnapshot, PpmModel,
        Probe, ProbeBuilder, Result, SampleBlock,
    };
}
