//! True-peak estimation by 4x cubic Hermite oversampling (ITU-R BS.1770-4 annex 2).

use super::math::amplitude_to_db;
use serde::{Deserialize, Serialize};

/// Fractional positions evaluated between each pair of samples.
const OFFSETS: [f64; 4] = [0.0, 0.25, 0.5, 0.75];

/// Cubic Hermite (Catmull-Rom) interpolation between `y1` (t = 0) and `y2` (t = 1).
#[inline]
pub fn hermite(y0: f64, y1: f64, y2: f64, y3: f64, t: f64) -> f64 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * t + c2) * t + c1) * t + c0
}

/// Linear true-peak of one channel block.
///
/// Never below the raw sample peak. Blocks shorter than four samples fall
/// back to the sample peak.
pub fn channel_true_peak(samples: &[f32]) -> f64 {
    let mut max_abs = samples
        .iter()
        .fold(0.0f64, |acc, &s| acc.max((s as f64).abs()));

    if samples.len() < 4 {
        return max_abs;
    }

    for w in samples.windows(4) {
        let (y0, y1, y2, y3) = (w[0] as f64, w[1] as f64, w[2] as f64, w[3] as f64);
        for &t in &OFFSETS {
            max_abs = max_abs.max(hermite(y0, y1, y2, y3, t).abs());
        }
    }
    max_abs
}

/// True-peak levels in dBTP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruePeakReading {
    pub left: f64,
    pub right: f64,
    /// Highest level on either channel since the last reset.
    pub max: f64,
}

impl Default for TruePeakReading {
    fn default() -> Self {
        Self {
            left: f64::NEG_INFINITY,
            right: f64::NEG_INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TruePeakDetector {
    max_left: f64,
    max_right: f64,
}

impl TruePeakDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, left: &[f32], right: &[f32]) -> TruePeakReading {
        let peak_l = channel_true_peak(left);
        let peak_r = channel_true_peak(right);
        self.max_left = self.max_left.max(peak_l);
        self.max_right = self.max_right.max(peak_r);

        TruePeakReading {
            left: amplitude_to_db(peak_l),
            right: amplitude_to_db(peak_r),
            max: self.max_since_reset(),
        }
    }

    /// Running maximum across both channels in dBTP.
    pub fn max_since_reset(&self) -> f64 {
        amplitude_to_db(self.max_left.max(self.max_right))
    }

    /// Per-channel running maxima in dBTP.
    pub fn channel_max(&self) -> (f64, f64) {
        (amplitude_to_db(self.max_left), amplitude_to_db(self.max_right))
    }

    pub fn reset(&mut self) {
        self.max_left = 0.0;
        self.max_right = 0.0;
    }
}
