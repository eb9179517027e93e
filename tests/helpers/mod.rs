//! Test helpers and fixtures for loudprobe integration tests.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations
//! - `LEVEL_DB` (0.1): Level conversions and steady-tone loudness
//! - `TRUE_PEAK_DB` (0.3): Interpolated peak of a full-scale tone
//! - `RATIO_EPSILON` (0.05): Balance, width and correlation ratios

#![allow(dead_code)]

pub mod tolerances;

use loudprobe::prelude::*;
use std::time::{Duration, Instant};

/// Default test sample rate (broadcast reference rate)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// 10 ms blocks at the test sample rate
pub const TEST_BLOCK_SIZE: usize = 480;

/// Create an engine at the test sample rate and block size.
pub fn test_engine() -> MeteringEngine {
    MeteringEngine::new(MeterConfig::new(TEST_SAMPLE_RATE, TEST_BLOCK_SIZE))
        .expect("Failed to create test engine")
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Sine at `amplitude` peak.
pub fn generate_tone(frequency: f64, amplitude: f32, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    scaled(&generate_sine(frequency, sample_rate, num_samples), amplitude)
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

pub fn scaled(samples: &[f32], gain: f32) -> Vec<f32> {
    samples.iter().map(|s| s * gain).collect()
}

pub fn inverted(samples: &[f32]) -> Vec<f32> {
    samples.iter().map(|s| -s).collect()
}

/// Interleave two channels as `L R L R ...`.
pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Meter a whole signal block by block; a trailing partial block is ignored.
pub fn meter_signal(engine: &mut MeteringEngine, left: &[f32], right: &[f32]) -> Vec<MetricsSnapshot> {
    let block = engine.block_size();
    let sample_rate = engine.sample_rate();
    left.chunks_exact(block)
        .zip(right.chunks_exact(block))
        .map(|(l, r)| {
            engine
                .process(&SampleBlock::new(l, r, sample_rate))
                .expect("block rejected")
        })
        .collect()
}

/// Meter a signal and return only the final snapshot.
pub fn meter_last(engine: &mut MeteringEngine, left: &[f32], right: &[f32]) -> MetricsSnapshot {
    meter_signal(engine, left, right)
        .pop()
        .expect("signal shorter than one block")
}

/// Poll `condition` every millisecond until it holds or `max_wait_ms` passes.
pub fn wait_until(max_wait_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Wait for the metering thread to publish at least `blocks` snapshots.
pub fn wait_for_blocks(handle: &MeterHandle, blocks: u64, max_wait_ms: u64) -> bool {
    wait_until(max_wait_ms, || handle.blocks_processed() >= blocks)
}
