//! DSP math utilities for metering.

/// Guard added to logarithm arguments so silence stays finite.
pub const LOG_EPSILON: f64 = 1e-12;

/// Guard added to correlation denominators.
pub const CORRELATION_EPSILON: f64 = 1e-20;

/// BS.1770 loudness offset applied to the K-weighted mean square.
pub const LUFS_OFFSET: f64 = -0.691;

/// Convert linear amplitude to decibels (guarded, never NaN for non-negative input).
#[inline]
pub fn amplitude_to_db(amp: f64) -> f64 {
    20.0 * (amp + LOG_EPSILON).log10()
}

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Mean-square energy to LUFS.
#[inline]
pub fn energy_to_lufs(mean_square: f64) -> f64 {
    LUFS_OFFSET + 10.0 * (mean_square + LOG_EPSILON).log10()
}

/// LUFS back to mean-square energy.
#[inline]
pub fn lufs_to_energy(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LUFS_OFFSET) / 10.0)
}

#[inline]
pub fn mean_square(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    sum / samples.len() as f64
}

#[inline]
pub fn rms(samples: &[f32]) -> f64 {
    mean_square(samples).sqrt()
}

#[inline]
pub fn sample_peak(samples: &[f32]) -> f64 {
    samples
        .iter()
        .fold(0.0f64, |acc, &s| acc.max((s as f64).abs()))
}

/// Replace non-finite samples with zero. Returns how many were replaced.
pub fn sanitize(samples: &mut [f32]) -> usize {
    let mut replaced = 0;
    for s in samples.iter_mut() {
        if !s.is_finite() {
            *s = 0.0;
            replaced += 1;
        }
    }
    replaced
}

#[inline]
pub fn count_non_finite(samples: &[f32]) -> usize {
    samples.iter().filter(|s| !s.is_finite()).count()
}

/// Stereo buffer statistics for correlation/width analysis.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StereoStats {
    pub(crate) left_rms: f64,
    pub(crate) right_rms: f64,
    pub(crate) mid_rms: f64,
    pub(crate) side_rms: f64,
    pub(crate) correlation: f64,
}

impl StereoStats {
    pub(crate) fn compute(left: &[f32], right: &[f32]) -> Self {
        let len = left.len().min(right.len());
        if len == 0 {
            return Self::default();
        }
        let n = len as f64;

        let mut sum_l = 0.0f64;
        let mut sum_r = 0.0f64;
        for i in 0..len {
            sum_l += left[i] as f64;
            sum_r += right[i] as f64;
        }
        let mean_l = sum_l / n;
        let mean_r = sum_r / n;

        let mut sum_l_sq = 0.0f64;
        let mut sum_r_sq = 0.0f64;
        let mut cov = 0.0f64;
        let mut var_l = 0.0f64;
        let mut var_r = 0.0f64;
        let mut sum_mid_sq = 0.0f64;
        let mut sum_side_sq = 0.0f64;

        for i in 0..len {
            let l = left[i] as f64;
            let r = right[i] as f64;
            sum_l_sq += l * l;
            sum_r_sq += r * r;

            let dl = l - mean_l;
            let dr = r - mean_r;
            cov += dl * dr;
            var_l += dl * dl;
            var_r += dr * dr;

            let mid = (l + r) * 0.5;
            let side = (l - r) * 0.5;
            sum_mid_sq += mid * mid;
            sum_side_sq += side * side;
        }

        let correlation = (cov / ((var_l * var_r).sqrt() + CORRELATION_EPSILON)).clamp(-1.0, 1.0);

        Self {
            left_rms: (sum_l_sq / n).sqrt(),
            right_rms: (sum_r_sq / n).sqrt(),
            mid_rms: (sum_mid_sq / n).sqrt(),
            side_rms: (sum_side_sq / n).sqrt(),
            correlation,
        }
    }

    /// Side share of the M/S energy: 0 for mono, 1 for a pure side signal.
    #[inline]
    pub(crate) fn width(&self) -> f64 {
        self.side_rms / (self.mid_rms + self.side_rms + LOG_EPSILON)
    }

    #[inline]
    pub(crate) fn balance(&self) -> f64 {
        let total = self.left_rms + self.right_rms;
        if total > LOG_EPSILON {
            ((self.right_rms - self.left_rms) / total).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(freq: f64, amp: f64, sr: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (amp * (2.0 * std::f64::consts::PI * freq * i as f64 / sr).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_amplitude_db_conversion() {
        assert_abs_diff_eq!(amplitude_to_db(1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(amplitude_to_db(0.5), -6.02, epsilon = 0.1);
        assert_abs_diff_eq!(db_to_amplitude(0.0), 1.0, epsilon = 1e-9);
        for db in [-40.0, -18.0, -6.0, 0.0, 3.0] {
            let back = amplitude_to_db(db_to_amplitude(db));
            assert!((db_to_amplitude(back) / db_to_amplitude(db) - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_silence_is_finite() {
        assert!(amplitude_to_db(0.0).is_finite());
        assert!(energy_to_lufs(0.0).is_finite());
    }

    #[test]
    fn test_lufs_energy_inverse() {
        for lufs in [-60.0, -23.0, -3.01] {
            assert_abs_diff_eq!(energy_to_lufs(lufs_to_energy(lufs)), lufs, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_sine_rms_and_crest() {
        let s = sine(1000.0, 0.5, 48000.0, 48000);
        let r = rms(&s);
        assert_abs_diff_eq!(r, 0.5 / 2.0_f64.sqrt(), epsilon = 0.001);
        let crest = amplitude_to_db(sample_peak(&s)) - amplitude_to_db(r);
        assert_abs_diff_eq!(crest, 3.01, epsilon = 0.1);
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let mut buf = [0.5, f32::NAN, f32::INFINITY, -0.25, f32::NEG_INFINITY];
        assert_eq!(count_non_finite(&buf), 3);
        assert_eq!(sanitize(&mut buf), 3);
        assert_eq!(buf, [0.5, 0.0, 0.0, -0.25, 0.0]);
    }

    #[test]
    fn test_stereo_stats_mono() {
        let buf = sine(440.0, 0.5, 48000.0, 4800);
        let stats = StereoStats::compute(&buf, &buf);
        assert_abs_diff_eq!(stats.correlation, 1.0, epsilon = 0.01);
        assert_abs_diff_eq!(stats.width(), 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(stats.balance(), 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_stereo_stats_inverted() {
        let left = sine(440.0, 0.5, 48000.0, 4800);
        let right: Vec<f32> = left.iter().map(|&x| -x).collect();
        let stats = StereoStats::compute(&left, &right);
        assert_abs_diff_eq!(stats.correlation, -1.0, epsilon = 0.01);
        assert_abs_diff_eq!(stats.width(), 1.0, epsilon = 0.1);
    }

    #[test]
    fn test_stereo_stats_silence() {
        let buf = [0.0f32; 256];
        let stats = StereoStats::compute(&buf, &buf);
        assert_eq!(stats.correlation, 0.0);
        assert_eq!(stats.balance(), 0.0);
        assert!(stats.width().is_finite());
    }
}
