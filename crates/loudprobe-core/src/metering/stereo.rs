//! Stereo correlation, balance and width analysis.

use super::math::StereoStats;
use serde::{Deserialize, Serialize};

/// Smoothing toward more negative correlation (phase trouble shows up fast).
pub const CORRELATION_ATTACK: f64 = 0.25;
/// Smoothing toward more positive correlation.
pub const CORRELATION_RELEASE: f64 = 0.06;
/// Symmetric smoothing for balance and width.
pub const BALANCE_WIDTH_ALPHA: f64 = 0.15;

/// Smoothed stereo field reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StereoReading {
    /// Phase correlation in [-1, 1]: 1 mono, 0 uncorrelated, -1 out of phase.
    pub correlation: f64,
    /// Left/right balance in [-1, 1]: -1 hard left, 1 hard right.
    pub balance: f64,
    /// Side share of the M/S signal: 0 mono, 1 pure side.
    pub width: f64,
}

impl StereoReading {
    /// Significantly negative correlation; mono fold-down will cancel.
    pub fn has_phase_issues(&self) -> bool {
        self.correlation < -0.3
    }

    pub fn is_mono(&self) -> bool {
        self.correlation > 0.95 && self.width < 0.05
    }
}

/// Instantaneous (unsmoothed) reading of one block.
pub fn analyze_stereo(left: &[f32], right: &[f32]) -> StereoReading {
    let stats = StereoStats::compute(left, right);
    StereoReading {
        correlation: stats.correlation,
        balance: stats.balance(),
        width: stats.width(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct StereoAnalyzer {
    current: StereoReading,
}

impl StereoAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, left: &[f32], right: &[f32]) -> StereoReading {
        let instant = analyze_stereo(left, right);

        let corr_alpha = if instant.correlation < self.current.correlation {
            CORRELATION_ATTACK
        } else {
            CORRELATION_RELEASE
        };
        self.current.correlation = smooth(self.current.correlation, instant.correlation, corr_alpha);
        self.current.balance = smooth(self.current.balance, instant.balance, BALANCE_WIDTH_ALPHA);
        self.current.width = smooth(self.current.width, instant.width, BALANCE_WIDTH_ALPHA);

        self.current
    }

    pub fn current(&self) -> StereoReading {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = StereoReading::default();
    }
}

#[inline]
fn smooth(current: f64, target: f64, alpha: f64) -> f64 {
    current + alpha * (target - current)
}
