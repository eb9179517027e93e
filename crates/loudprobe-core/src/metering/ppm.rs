//! Quasi-peak programme meter (IEC 60268-10 Type I, Nordic/DIN).
//!
//! Two detector models share one interface:
//! - [`RcDetector`]: full-wave rectifier into a one-pole charge/discharge envelope.
//! - [`WindowDetector`]: 5 ms sub-window sample peaks with instant attack and a
//!   linear-in-dB fall of 20 dB per 1.7 s.
//!
//! Detector output is in dBFS. [`PpmChannel`] clamps it to the display range
//! and tracks a 3 s peak hold. Elapsed time is always passed in by the caller.

use super::math::amplitude_to_db;
use serde::{Deserialize, Serialize};

/// Attack time constant of the RC model (~1 dB short of a steady tone after 5 ms).
pub const RC_ATTACK_TAU: f64 = 0.0017;
/// Release time constant of the RC model (20 dB fall in 1.7 s).
pub const RC_DECAY_TAU: f64 = 0.740;
/// Fall rate of the window model in dB per second.
pub const DECAY_DB_PER_SEC: f64 = 20.0 / 1.7;
pub const WINDOW_SECS: f64 = 0.005;
pub const HYSTERESIS_DB: f64 = 0.1;

/// EBU R68 alignment: 0 PPM sits at -18 dBFS.
pub const PPM_OFFSET_DB: f64 = 18.0;
pub const DISPLAY_FLOOR_DBFS: f64 = -54.0;
pub const DISPLAY_CEILING_DBFS: f64 = -9.0;
pub const PEAK_HOLD_SECS: f64 = 3.0;

#[inline]
pub fn dbfs_to_ppm(dbfs: f64) -> f64 {
    dbfs + PPM_OFFSET_DB
}

#[inline]
pub fn ppm_to_dbfs(ppm: f64) -> f64 {
    ppm - PPM_OFFSET_DB
}

/// One-pole smoothing coefficient for time constant `tau` over step `dt`.
#[inline]
fn one_pole_alpha(dt: f64, tau: f64) -> f64 {
    if tau <= 0.0 {
        1.0
    } else {
        1.0 - (-dt / tau).exp()
    }
}

/// Detector model, fixed when the meter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PpmModel {
    #[default]
    Rc,
    Window,
}

/// Quasi-peak detector ballistics.
pub trait PpmBallistics: Send {
    /// Run one block of raw samples and return the detector level in dBFS.
    fn process(&mut self, samples: &[f32], sample_rate: f64) -> f64;

    fn reset(&mut self);
}

/// Rectifier + RC envelope.
#[derive(Debug, Clone)]
pub struct RcDetector {
    envelope: f64,
    attack_alpha: f64,
    decay_alpha: f64,
    sample_rate: f64,
}

impl RcDetector {
    pub fn new(sample_rate: f64) -> Self {
        let dt = 1.0 / sample_rate;
        Self {
            envelope: 0.0,
            attack_alpha: one_pole_alpha(dt, RC_ATTACK_TAU),
            decay_alpha: one_pole_alpha(dt, RC_DECAY_TAU),
            sample_rate,
        }
    }

    pub fn envelope(&self) -> f64 {
        self.envelope
    }

    #[inline]
    fn tick(&mut self, x: f64) {
        let rectified = x.abs();
        if rectified > self.envelope {
            self.envelope += self.attack_alpha * (rectified - self.envelope);
        } else {
            self.envelope -= self.decay_alpha * self.envelope;
        }
    }
}

impl PpmBallistics for RcDetector {
    fn process(&mut self, samples: &[f32], sample_rate: f64) -> f64 {
        if sample_rate != self.sample_rate {
            *self = Self {
                envelope: self.envelope,
                ..Self::new(sample_rate)
            };
        }
        for &s in samples {
            self.tick(s as f64);
        }
        amplitude_to_db(self.envelope)
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// Sub-window peak detector with explicit dB-linear fall.
#[derive(Debug, Clone)]
pub struct WindowDetector {
    held_db: f64,
}

impl Default for WindowDetector {
    fn default() -> Self {
        Self {
            held_db: f64::NEG_INFINITY,
        }
    }
}

impl WindowDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_db(&self) -> f64 {
        self.held_db
    }

    /// Apply one sub-window peak lasting `dt` seconds.
    fn step(&mut self, peak_db: f64, dt: f64) {
        if peak_db >= self.held_db + HYSTERESIS_DB {
            self.held_db = peak_db;
        } else if peak_db <= self.held_db - HYSTERESIS_DB {
            self.held_db = (self.held_db - DECAY_DB_PER_SEC * dt).max(peak_db);
        }
        // Within the hysteresis band the needle stays put.
    }
}

impl PpmBallistics for WindowDetector {
    fn process(&mut self, samples: &[f32], sample_rate: f64) -> f64 {
        let window = ((WINDOW_SECS * sample_rate).round() as usize).max(1);
        for chunk in samples.chunks(window) {
            let peak = chunk
                .iter()
                .fold(0.0f64, |acc, &s| acc.max((s as f64).abs()));
            self.step(amplitude_to_db(peak), chunk.len() as f64 / sample_rate);
        }
        self.held_db
    }

    fn reset(&mut self) {
        self.held_db = f64::NEG_INFINITY;
    }
}

/// Display-ready PPM reading for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PpmReading {
    /// Detector level clamped to the display range, in dBFS.
    pub dbfs: f64,
    /// The same level on the PPM scale.
    pub ppm: f64,
    /// Peak-hold level in dBFS.
    pub hold_dbfs: f64,
    /// At or within 1 dB of the display floor.
    pub silent: bool,
}

impl Default for PpmReading {
    fn default() -> Self {
        Self {
            dbfs: DISPLAY_FLOOR_DBFS,
            ppm: dbfs_to_ppm(DISPLAY_FLOOR_DBFS),
            hold_dbfs: DISPLAY_FLOOR_DBFS,
            silent: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StereoPpm {
    pub left: PpmReading,
    pub right: PpmReading,
}

/// One channel: detector, display clamp and peak hold.
pub struct PpmChannel {
    detector: Box<dyn PpmBallistics>,
    hold_dbfs: f64,
    hold_timer: f64,
}

impl PpmChannel {
    pub fn new(model: PpmModel, sample_rate: f64) -> Self {
        let detector: Box<dyn PpmBallistics> = match model {
            PpmModel::Rc => Box::new(RcDetector::new(sample_rate)),
            PpmModel::Window => Box::new(WindowDetector::new()),
        };
        Self::with_detector(detector)
    }

    pub fn with_detector(detector: Box<dyn PpmBallistics>) -> Self {
        Self {
            detector,
            hold_dbfs: DISPLAY_FLOOR_DBFS,
            hold_timer: 0.0,
        }
    }

    /// Process one block covering `dt` seconds.
    pub fn update(&mut self, samples: &[f32], sample_rate: f64, dt: f64) -> PpmReading {
        let raw = self.detector.process(samples, sample_rate);
        let dbfs = if raw.is_nan() {
            DISPLAY_FLOOR_DBFS
        } else {
            raw.clamp(DISPLAY_FLOOR_DBFS, DISPLAY_CEILING_DBFS)
        };

        if dbfs > self.hold_dbfs {
            self.hold_dbfs = dbfs;
            self.hold_timer = 0.0;
        } else {
            self.hold_timer += dt;
            if self.hold_timer >= PEAK_HOLD_SECS {
                self.hold_dbfs = dbfs;
                self.hold_timer = 0.0;
            }
        }

        PpmReading {
            dbfs,
            ppm: dbfs_to_ppm(dbfs),
            hold_dbfs: self.hold_dbfs,
            silent: dbfs <= DISPLAY_FLOOR_DBFS + 1.0,
        }
    }

    pub fn reset(&mut self) {
        self.detector.reset();
        self.hold_dbfs = DISPLAY_FLOOR_DBFS;
        self.hold_timer = 0.0;
    }
}

/// Stereo PPM with independent channels.
pub struct PpmMeter {
    left: PpmChannel,
    right: PpmChannel,
    model: PpmModel,
    sample_rate: f64,
}

impl PpmMeter {
    pub fn new(model: PpmModel, sample_rate: f64) -> Self {
        Self {
            left: PpmChannel::new(model, sample_rate),
            right: PpmChannel::new(model, sample_rate),
            model,
            sample_rate,
        }
    }

    pub fn model(&self) -> PpmModel {
        self.model
    }

    pub fn update(&mut self, left: &[f32], right: &[f32], dt: f64) -> StereoPpm {
        StereoPpm {
            left: self.left.update(left, self.sample_rate, dt),
            right: self.right.update(right, self.sample_rate, dt),
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
