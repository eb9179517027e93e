//! Offline two-pass loudness measurement.
//!
//! Wraps the `ebur128` crate so streaming readings can be cross-checked against
//! a whole-programme BS.1770 measurement. Note that BS.1770 sums channel
//! energies where the streaming engine averages them, so for identical stereo
//! channels the streaming reading sits 3.01 dB lower.

use crate::{Error, Result};
use ebur128::{EbuR128, Mode};

/// Whole-programme loudness of a stereo buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessResult {
    pub integrated_lufs: f64,
    pub true_peak_dbtp: f64,
    pub loudness_range_lu: f64,
}

/// Channel energy summation offset between BS.1770 and equal-weight averaging.
pub const CHANNEL_SUM_OFFSET_DB: f64 = 3.0103;

pub fn analyze_loudness(left: &[f32], right: &[f32], sample_rate: u32) -> Result<LoudnessResult> {
    if left.len() != right.len() {
        return Err(Error::ChannelLengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut meter = EbuR128::new(2, sample_rate, Mode::I | Mode::LRA | Mode::TRUE_PEAK)
        .map_err(|e| Error::Reference(e.to_string()))?;

    if !left.is_empty() {
        meter
            .add_frames_planar_f32(&[left, right])
            .map_err(|e| Error::Reference(e.to_string()))?;
    }

    let integrated_lufs = meter
        .loudness_global()
        .map_err(|e| Error::Reference(e.to_string()))?;
    let loudness_range_lu = meter
        .loudness_range()
        .map_err(|e| Error::Reference(e.to_string()))?;

    let true_peak_l = meter.true_peak(0).unwrap_or(0.0);
    let true_peak_r = meter.true_peak(1).unwrap_or(0.0);
    let true_peak_linear = true_peak_l.max(true_peak_r);

    let true_peak_dbtp = if true_peak_linear > 0.0 {
        20.0 * true_peak_linear.log10()
    } else {
        f64::NEG_INFINITY
    };

    Ok(LoudnessResult {
        integrated_lufs,
        true_peak_dbtp,
        loudness_range_lu,
    })
}
