//! Tolerance constants for metering tests.
//!
//! Different measurements require different precision levels.

/// Floating point rounding errors.
pub const FLOAT_EPSILON: f64 = 1e-6;

/// Level conversions and steady-tone loudness, in dB.
pub const LEVEL_DB: f64 = 0.1;

/// Loudness of a tone after K-weighting, in LU.
pub const LOUDNESS_LU: f64 = 0.2;

/// Interpolated true peak of a full-scale tone, in dB.
pub const TRUE_PEAK_DB: f64 = 0.3;

/// True peak of a scaled tone, and the allowed shortfall below sample peak.
pub const TRUE_PEAK_SCALED_DB: f64 = 0.5;

/// Ratios in [-1, 1] such as balance, width and correlation.
pub const RATIO_EPSILON: f64 = 0.05;

/// Correlation of unrelated tones.
pub const UNCORRELATED_EPSILON: f64 = 0.2;

/// PPM decay after 1.7 s, in dB.
pub const PPM_DECAY_DB: f64 = 0.5;

/// Difference between the streaming and two-pass reference measurements, in LU.
pub const REFERENCE_LU: f64 = 0.2;
