//! Anomaly reporting hooks for the metering engine.
//!
//! The engine owns one observer and calls it from the processing thread. None
//! of these conditions stop measurement.

/// Receives anomalies noticed while metering.
pub trait MeterObserver: Send {
    /// Non-finite samples were replaced with silence before metering.
    fn non_finite_samples(&mut self, _sequence: u64, _count: usize) {}

    /// K-weighting runs 48 kHz literal coefficients at another rate.
    fn reduced_accuracy(&mut self, _sample_rate: f64) {}

    /// A caller-supplied sequence number skipped ahead or went backwards.
    fn sequence_gap(&mut self, _expected: u64, _actual: u64) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MeterObserver for NoopObserver {}

/// Forwards anomalies to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MeterObserver for TracingObserver {
    fn non_finite_samples(&mut self, sequence: u64, count: usize) {
        tracing::warn!(sequence, count, "replaced non-finite samples with silence");
    }

    fn reduced_accuracy(&mut self, sample_rate: f64) {
        tracing::warn!(
            sample_rate,
            "K-weighting uses 48 kHz coefficients at {} Hz; loudness may deviate by more than 0.1 dB",
            sample_rate
        );
    }

    fn sequence_gap(&mut self, expected: u64, actual: u64) {
        tracing::debug!(expected, actual, "block sequence gap");
    }
}
