//! Metering engine configuration.

use crate::metering::{CoefficientMode, PpmModel};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// What to do with NaN/Infinity samples delivered by a misbehaving capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NonFinitePolicy {
    /// Replace each non-finite sample with silence and keep going.
    #[default]
    Zero,
    /// Refuse the whole block with [`Error::NonFiniteSamples`].
    Reject,
}

/// Configuration for a [`MeteringEngine`](crate::MeteringEngine).
///
/// Window lengths are derived from `sample_rate` and `block_size` once, when the
/// engine is built. Changing either one means building a new engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub sample_rate: f64,
    /// Frames per block. Every block handed to the engine must have this length.
    pub block_size: usize,
    pub ppm_model: PpmModel,
    pub k_weighting: CoefficientMode,
    pub non_finite: NonFinitePolicy,
    /// Capacity of the short-term history ring used for loudness range.
    pub lra_history_len: usize,
    /// Blocks whose sample peak stays below this level are reported inactive.
    pub activity_threshold_dbfs: f64,
    /// Opaque probe identity copied into every snapshot.
    pub probe: String,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 480,
            ppm_model: PpmModel::default(),
            k_weighting: CoefficientMode::default(),
            non_finite: NonFinitePolicy::default(),
            lra_history_len: 3000,
            activity_threshold_dbfs: -70.0,
            probe: String::new(),
        }
    }
}

impl MeterConfig {
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            ..Self::default()
        }
    }

    /// Duration of one block in seconds.
    #[inline]
    pub fn block_duration(&self) -> f64 {
        self.block_size as f64 / self.sample_rate
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.block_size < 4 {
            return Err(Error::InvalidConfig(format!(
                "block_size {} too small (minimum 4 frames)",
                self.block_size
            )));
        }
        if self.block_duration() > 1.0 {
            return Err(Error::InvalidConfig(format!(
                "block_size {} exceeds one second of audio at {} Hz",
                self.block_size, self.sample_rate
            )));
        }
        if self.lra_history_len < 15 {
            return Err(Error::InvalidConfig(format!(
                "lra_history_len {} below the 15 entries loudness range needs",
                self.lra_history_len
            )));
        }
        if !self.activity_threshold_dbfs.is_finite() {
            return Err(Error::InvalidConfig(
                "activity_threshold_dbfs must be finite".into(),
            ));
        }
        Ok(())
    }
}
