//! K-weighting pre-filter (ITU-R BS.1770-4).
//!
//! Two cascaded second-order sections per channel: a 38 Hz high-pass removing
//! sub-audible content, then a +4 dB high shelf around 1.7-4 kHz modelling the
//! acoustic effect of the head. Filter state is kept in transposed direct form II,
//! two values per section, four per channel.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sample rate the literal BS.1770-4 coefficients are defined for.
pub const REFERENCE_SAMPLE_RATE: f64 = 48000.0;

/// How filter coefficients are obtained for the configured sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoefficientMode {
    /// Literal coefficients at 48 kHz, bilinear transform of the analog prototype elsewhere.
    #[default]
    Derived,
    /// Literal 48 kHz coefficients at every rate. Deviation can exceed 0.1 dB off 48 kHz.
    Fixed48k,
}

/// Biquad coefficients, a0 normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// BS.1770-4 table 2, 48 kHz.
    pub const HIGH_PASS_48K: Self = Self {
        b0: 1.0,
        b1: -2.0,
        b2: 1.0,
        a1: -1.990_047_454_833_98,
        a2: 0.990_072_250_366_21,
    };

    /// BS.1770-4 table 1, 48 kHz.
    pub const HIGH_SHELF_48K: Self = Self {
        b0: 1.535_124_859_586_97,
        b1: -2.691_696_189_406_38,
        b2: 1.198_392_810_852_85,
        a1: -1.690_659_293_182_41,
        a2: 0.732_480_774_215_85,
    };

    /// High-pass stage recomputed for `sample_rate`.
    pub fn high_pass(sample_rate: f64) -> Self {
        let f0 = 38.135_470_876_024_44;
        let q = 0.500_327_037_323_877_3;

        let k = (PI * f0 / sample_rate).tan();
        let k2 = k * k;
        let a0 = 1.0 + k / q + k2;

        Self {
            b0: 1.0,
            b1: -2.0,
            b2: 1.0,
            a1: 2.0 * (k2 - 1.0) / a0,
            a2: (1.0 - k / q + k2) / a0,
        }
    }

    /// High-shelf stage recomputed for `sample_rate`.
    pub fn high_shelf(sample_rate: f64) -> Self {
        let f0 = 1_681.974_450_955_533;
        let gain_db = 3.999_843_853_973_347;
        let q = 0.707_175_236_955_419_6;

        let k = (PI * f0 / sample_rate).tan();
        let k2 = k * k;
        let vh = 10.0_f64.powf(gain_db / 20.0);
        let vb = vh.powf(0.499_666_774_154_541_6);
        let a0 = 1.0 + k / q + k2;

        Self {
            b0: (vh + vb * k / q + k2) / a0,
            b1: 2.0 * (k2 - vh) / a0,
            b2: (vh - vb * k / q + k2) / a0,
            a1: 2.0 * (k2 - 1.0) / a0,
            a2: (1.0 - k / q + k2) / a0,
        }
    }
}

/// One second-order section with its running state.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    s1: f64,
    s2: f64,
}

impl Biquad {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            s1: 0.0,
            s2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let y = c.b0 * x + self.s1;
        self.s1 = c.b1 * x - c.a1 * y + self.s2;
        self.s2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// K-weighting filter for a single channel.
#[derive(Debug, Clone)]
pub struct KWeightingFilter {
    high_pass: Biquad,
    high_shelf: Biquad,
    sample_rate: f64,
    reduced_accuracy: bool,
}

impl KWeightingFilter {
    pub fn new(sample_rate: f64, mode: CoefficientMode) -> Self {
        let exact_rate = (sample_rate - REFERENCE_SAMPLE_RATE).abs() < 0.5;

        let (high_pass, high_shelf, reduced_accuracy) = match (mode, exact_rate) {
            (_, true) => (
                BiquadCoeffs::HIGH_PASS_48K,
                BiquadCoeffs::HIGH_SHELF_48K,
                false,
            ),
            (CoefficientMode::Derived, false) => (
                BiquadCoeffs::high_pass(sample_rate),
                BiquadCoeffs::high_shelf(sample_rate),
                false,
            ),
            (CoefficientMode::Fixed48k, false) => (
                BiquadCoeffs::HIGH_PASS_48K,
                BiquadCoeffs::HIGH_SHELF_48K,
                true,
            ),
        };

        Self {
            high_pass: Biquad::new(high_pass),
            high_shelf: Biquad::new(high_shelf),
            sample_rate,
            reduced_accuracy,
        }
    }

    /// True when 48 kHz literals are applied at a different rate.
    pub fn is_reduced_accuracy(&self) -> bool {
        self.reduced_accuracy
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        self.high_shelf.process(self.high_pass.process(x))
    }

    /// Filter `input` into `output`. Processes `min(input.len(), output.len())` samples.
    pub fn apply(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process_sample(*x as f64) as f32;
        }
    }

    pub fn apply_in_place(&mut self, buffer: &mut [f32]) {
        for s in buffer.iter_mut() {
            *s = self.process_sample(*s as f64) as f32;
        }
    }

    pub fn reset(&mut self) {
        self.high_pass.reset();
        self.high_shelf.reset();
    }
}

/// K-weighting for a stereo pair.
#[derive(Debug, Clone)]
pub struct StereoKWeighting {
    left: KWeightingFilter,
    right: KWeightingFilter,
}

impl StereoKWeighting {
    pub fn new(sample_rate: f64, mode: CoefficientMode) -> Self {
        let filter = KWeightingFilter::new(sample_rate, mode);
        Self {
            left: filter.clone(),
            right: filter,
        }
    }

    pub fn is_reduced_accuracy(&self) -> bool {
        self.left.is_reduced_accuracy()
    }

    pub fn apply(
        &mut self,
        left: &[f32],
        right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        self.left.apply(left, out_left);
        self.right.apply(right, out_right);
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
