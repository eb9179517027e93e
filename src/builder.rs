//! Builder for configuring and constructing a `Probe`.

use crate::{Probe, Result};
use loudprobe_core::{
    CoefficientMode, MeterConfig, MeterObserver, NonFinitePolicy, PpmModel, TracingObserver,
};
use loudprobe_live::LiveConfig;
use std::time::Duration;

/// Every setting has a broadcast default: 48 kHz, 10 ms blocks, RC PPM,
/// derived K-weighting coefficients and a one second capture ring.
///
/// # Example
///
/// ```ignore
/// use loudprobe::prelude::*;
///
/// let probe = Probe::builder()
///     .sample_rate(44100.0)
///     .block_size(441)
///     .probe("studio-a")
///     .build()?;
///
/// let mut input = probe.take_input().unwrap();
/// input.push_interleaved(&capture_buffer);
/// ```
pub struct ProbeBuilder {
    config: MeterConfig,
    ring_capacity: Option<usize>,
    idle_poll: Duration,
    observer: Option<Box<dyn MeterObserver>>,
}

impl Default for ProbeBuilder {
    fn default() -> Self {
        Self {
            config: MeterConfig::default(),
            ring_capacity: None,
            idle_poll: LiveConfig::default().idle_poll,
            observer: None,
        }
    }
}

impl ProbeBuilder {
    /// Replace the whole metering configuration.
    pub fn config(mut self, config: MeterConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 48000
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 480 frames
    pub fn block_size(mut self, frames: usize) -> Self {
        self.config.block_size = frames;
        self
    }

    pub fn ppm_model(mut self, model: PpmModel) -> Self {
        self.config.ppm_model = model;
        self
    }

    pub fn k_weighting(mut self, mode: CoefficientMode) -> Self {
        self.config.k_weighting = mode;
        self
    }

    pub fn non_finite(mut self, policy: NonFinitePolicy) -> Self {
        self.config.non_finite = policy;
        self
    }

    pub fn activity_threshold_dbfs(mut self, dbfs: f64) -> Self {
        self.config.activity_threshold_dbfs = dbfs;
        self
    }

    /// Identity copied into every snapshot.
    pub fn probe(mut self, name: impl Into<String>) -> Self {
        self.config.probe = name.into();
        self
    }

    /// Capture ring capacity in frames. Default: one second of audio.
    pub fn ring_capacity(mut self, frames: usize) -> Self {
        self.ring_capacity = Some(frames);
        self
    }

    pub fn idle_poll(mut self, interval: Duration) -> Self {
        self.idle_poll = interval;
        self
    }

    /// Default: forwards anomalies to `tracing`.
    pub fn observer(mut self, observer: Box<dyn MeterObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<Probe> {
        let mut live = LiveConfig::for_sample_rate(self.config.sample_rate);
        if let Some(frames) = self.ring_capacity {
            live.ring_capacity = frames.max(self.config.block_size);
        }
        live.idle_poll = self.idle_poll;

        let observer = self
            .observer
            .unwrap_or_else(|| Box::new(TracingObserver));
        Probe::start(self.config, live, observer)
    }
}
