//! Measurement orchestrator.
//!
//! Owns every detector and threads one block through all of them:
//! K-weighting into the loudness accumulator, raw samples into true-peak, PPM
//! and stereo analysis. Single owner, no internal locking; blocks must arrive
//! in order on one thread.

use super::math::{amplitude_to_db, count_non_finite, sample_peak, sanitize};
use super::observer::{MeterObserver, NoopObserver, TracingObserver};
use super::snapshot::{MetricsSnapshot, Readiness, Timestamp, SCHEMA_VERSION};
use super::{
    LoudnessAccumulator, PpmMeter, StereoAnalyzer, StereoKWeighting, TruePeakDetector,
};
use crate::config::{MeterConfig, NonFinitePolicy};
use crate::{Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// One stereo block, borrowed for the duration of a single `process` call.
#[derive(Debug, Clone, Copy)]
pub struct SampleBlock<'a> {
    pub left: &'a [f32],
    pub right: &'a [f32],
    pub sample_rate: f64,
    pub sequence: Option<u64>,
}

impl<'a> SampleBlock<'a> {
    pub fn new(left: &'a [f32], right: &'a [f32], sample_rate: f64) -> Self {
        Self {
            left,
            right,
            sample_rate,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Broadcast metering engine.
pub struct MeteringEngine {
    config: MeterConfig,
    k_weighting: StereoKWeighting,
    loudness: LoudnessAccumulator,
    true_peak: TruePeakDetector,
    ppm: PpmMeter,
    stereo: StereoAnalyzer,
    observer: Box<dyn MeterObserver>,

    raw_left: Vec<f32>,
    raw_right: Vec<f32>,
    weighted_left: Vec<f32>,
    weighted_right: Vec<f32>,

    elapsed_secs: f64,
    next_sequence: u64,
    last_caller_sequence: Option<u64>,
}

impl MeteringEngine {
    pub fn new(config: MeterConfig) -> Result<Self> {
        Self::with_observer(config, Box::new(TracingObserver))
    }

    pub fn with_observer(config: MeterConfig, mut observer: Box<dyn MeterObserver>) -> Result<Self> {
        config.validate()?;

        let k_weighting = StereoKWeighting::new(config.sample_rate, config.k_weighting);
        if k_weighting.is_reduced_accuracy() {
            observer.reduced_accuracy(config.sample_rate);
        }

        let loudness = LoudnessAccumulator::new(config.block_duration(), config.lra_history_len);
        tracing::debug!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            momentary_blocks = loudness.momentary_len(),
            short_term_blocks = loudness.short_term_len(),
            "metering engine created"
        );

        let n = config.block_size;
        Ok(Self {
            k_weighting,
            loudness,
            true_peak: TruePeakDetector::new(),
            ppm: PpmMeter::new(config.ppm_model, config.sample_rate),
            stereo: StereoAnalyzer::new(),
            observer,
            raw_left: vec![0.0; n],
            raw_right: vec![0.0; n],
            weighted_left: vec![0.0; n],
            weighted_right: vec![0.0; n],
            elapsed_secs: 0.0,
            next_sequence: 0,
            last_caller_sequence: None,
            config,
        })
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Seconds of audio processed since construction or the last reset.
    pub fn elapsed(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn k_weighting_reduced_accuracy(&self) -> bool {
        self.k_weighting.is_reduced_accuracy()
    }

    /// Running true-peak maximum across both channels since the last reset, in dBTP.
    pub fn true_peak_max(&self) -> f64 {
        self.true_peak.max_since_reset()
    }

    /// Meter one block and assemble its snapshot.
    pub fn process(&mut self, block: &SampleBlock<'_>) -> Result<MetricsSnapshot> {
        self.validate_block(block)?;
        let n = self.config.block_size;

        let bad = count_non_finite(block.left) + count_non_finite(block.right);
        if bad > 0 && self.config.non_finite == NonFinitePolicy::Reject {
            return Err(Error::NonFiniteSamples { count: bad });
        }

        self.raw_left.copy_from_slice(block.left);
        self.raw_right.copy_from_slice(block.right);
        let sequence = self.resolve_sequence(block.sequence);

        if bad > 0 {
            sanitize(&mut self.raw_left);
            sanitize(&mut self.raw_right);
            self.observer.non_finite_samples(sequence, bad);
        }

        self.k_weighting.apply(
            &self.raw_left,
            &self.raw_right,
            &mut self.weighted_left,
            &mut self.weighted_right,
        );
        self.loudness.push(LoudnessAccumulator::block_energy(
            &self.weighted_left,
            &self.weighted_right,
        ));

        let dt = n as f64 / self.config.sample_rate;
        let true_peak = self.true_peak.update(&self.raw_left, &self.raw_right);
        let ppm = self.ppm.update(&self.raw_left, &self.raw_right, dt);
        let stereo = self.stereo.update(&self.raw_left, &self.raw_right);

        self.elapsed_secs += dt;

        let peak = sample_peak(&self.raw_left).max(sample_peak(&self.raw_right));
        let is_active = amplitude_to_db(peak) >= self.config.activity_threshold_dbfs;

        Ok(MetricsSnapshot {
            schema_version: SCHEMA_VERSION,
            probe: self.config.probe.clone(),
            timestamp: Timestamp {
                capture_time_secs: self.elapsed_secs,
                wall_clock_ms: wall_clock_ms(),
                sequence,
            },
            lufs: self.loudness.readings(),
            true_peak,
            ppm,
            stereo,
            readiness: Readiness::at(self.elapsed_secs),
            is_active,
        })
    }

    /// Clear every detector, window, history, envelope and hold in one step.
    pub fn reset(&mut self) {
        self.k_weighting.reset();
        self.loudness.reset();
        self.true_peak.reset();
        self.ppm.reset();
        self.stereo.reset();
        self.elapsed_secs = 0.0;
        self.next_sequence = 0;
        self.last_caller_sequence = None;
        tracing::debug!("metering engine reset");
    }

    /// Rebuild every detector for a new configuration, keeping the observer.
    ///
    /// On error the engine is left untouched.
    pub fn reconfigure(&mut self, config: MeterConfig) -> Result<()> {
        config.validate()?;
        let observer = std::mem::replace(&mut self.observer, Box::new(NoopObserver));
        *self = Self::with_observer(config, observer)?;
        tracing::debug!(sample_rate = self.config.sample_rate, "metering engine reconfigured");
        Ok(())
    }

    fn validate_block(&self, block: &SampleBlock<'_>) -> Result<()> {
        let drift = (block.sample_rate - self.config.sample_rate).abs();
        if !drift.is_finite() || drift > 0.5 {
            return Err(Error::SampleRateMismatch {
                expected: self.config.sample_rate,
                actual: block.sample_rate,
            });
        }
        if block.left.len() != block.right.len() {
            return Err(Error::ChannelLengthMismatch {
                left: block.left.len(),
                right: block.right.len(),
            });
        }
        if block.left.len() != self.config.block_size {
            return Err(Error::BlockLengthMismatch {
                expected: self.config.block_size,
                actual: block.left.len(),
            });
        }
        Ok(())
    }

    fn resolve_sequence(&mut self, supplied: Option<u64>) -> u64 {
        let sequence = match supplied {
            Some(seq) => {
                if let Some(prev) = self.last_caller_sequence {
                    let expected = prev.wrapping_add(1);
                    if seq != expected {
                        self.observer.sequence_gap(expected, seq);
                    }
                }
                self.last_caller_sequence = Some(seq);
                seq
            }
            None => self.next_sequence,
        };
        self.next_sequence = sequence.wrapping_add(1);
        sequence
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
