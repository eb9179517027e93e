//! Live metering tests
//!
//! These tests run a `Probe` end to end: capture input into the ring buffer,
//! metering thread, and lock-free snapshot reads.
//!
//! Run with:
//! ```bash
//! cargo test -p loudprobe --test metering_audio_tests
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::{
    generate_tone, interleave, wait_for_blocks, wait_until, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE,
};
use loudprobe::prelude::*;
use loudprobe::{CaptureMeter, MeterObserver, SCHEMA_VERSION};
use std::sync::{Arc, Mutex};

const SR: f64 = TEST_SAMPLE_RATE;
const WAIT_MS: u64 = 10_000;

fn test_probe() -> Probe {
    Probe::builder()
        .sample_rate(SR)
        .block_size(TEST_BLOCK_SIZE)
        .ring_capacity(4 * SR as usize)
        .probe("studio-a")
        .build()
        .expect("Failed to create test probe")
}

/// Test loudness of a -6 dBFS tone pushed through the capture ring.
#[test]
fn test_probe_meters_interleaved_tone() {
    let probe = test_probe();
    let handle = probe.handle();
    let mut input = probe.take_input().unwrap();

    let tone = generate_tone(1000.0, 0.5, SR, 2 * SR as usize);
    assert_eq!(input.push_interleaved(&interleave(&tone, &tone)), tone.len());
    assert!(wait_for_blocks(&handle, 200, WAIT_MS));

    let snap = probe.latest().unwrap();
    assert!(snap.check_schema(SCHEMA_VERSION).is_ok());
    assert_eq!(snap.probe, "studio-a");
    assert_eq!(snap.timestamp.sequence, 199);
    assert_abs_diff_eq!(snap.timestamp.capture_time_secs, 2.0, epsilon = FLOAT_EPSILON);
    assert!(snap.readiness.momentary && !snap.readiness.short_term);
    assert_abs_diff_eq!(snap.lufs.momentary, -9.03, epsilon = LOUDNESS_LU);
    assert_abs_diff_eq!(snap.stereo.correlation, 1.0, epsilon = RATIO_EPSILON);
    assert!(snap.is_active);
    assert_eq!(handle.overflow_frames(), 0);
}

/// Test that planar pushes in odd-sized chunks assemble into whole blocks.
#[test]
fn test_probe_assembles_blocks_from_planar_chunks() {
    let probe = test_probe();
    let handle = probe.handle();
    let mut input = probe.take_input().unwrap();

    let tone = generate_tone(1000.0, 0.5, SR, 100 * TEST_BLOCK_SIZE);
    let silence = vec![0.0f32; tone.len()];
    for (l, r) in tone.chunks(333).zip(silence.chunks(333)) {
        input.push_planar(l, r).unwrap();
    }
    assert!(wait_for_blocks(&handle, 100, WAIT_MS));

    let snap = handle.latest().unwrap();
    assert_eq!(snap.timestamp.sequence, 99);
    assert!(snap.stereo.balance < -0.9);
    assert!(snap.ppm.right.silent);
}

/// Test that reset clears the published snapshot and restarts sequences.
#[test]
fn test_probe_reset() {
    let probe = test_probe();
    let handle = probe.handle();
    let mut input = probe.take_input().unwrap();

    let tone = generate_tone(1000.0, 0.5, SR, 50 * TEST_BLOCK_SIZE);
    input.push_planar(&tone, &tone).unwrap();
    assert!(wait_for_blocks(&handle, 50, WAIT_MS));

    probe.reset().unwrap();
    assert!(wait_until(WAIT_MS, || probe.latest().is_none()));

    input.push_planar(&tone[..TEST_BLOCK_SIZE], &tone[..TEST_BLOCK_SIZE]).unwrap();
    assert!(wait_for_blocks(&handle, 51, WAIT_MS));
    let snap = probe.latest().unwrap();
    assert_eq!(snap.timestamp.sequence, 0);
    assert_abs_diff_eq!(snap.timestamp.capture_time_secs, 0.01, epsilon = FLOAT_EPSILON);
}

/// Test that a sample-rate change keeps the block duration.
#[test]
fn test_probe_reconfigure_sample_rate() {
    let probe = test_probe();
    let handle = probe.handle();
    let mut input = probe.take_input().unwrap();

    let tone = generate_tone(1000.0, 0.5, SR, 10 * TEST_BLOCK_SIZE);
    input.push_planar(&tone, &tone).unwrap();
    assert!(wait_for_blocks(&handle, 10, WAIT_MS));

    probe.reconfigure(44100.0).unwrap();
    assert_eq!(probe.config().block_size, 441);
    assert!(wait_until(WAIT_MS, || probe.latest().is_none()));

    let tone = generate_tone(1000.0, 0.5, 44100.0, 100 * 441);
    input.push_planar(&tone, &tone).unwrap();
    assert!(wait_for_blocks(&handle, 110, WAIT_MS));

    let snap = probe.latest().unwrap();
    assert_eq!(snap.timestamp.sequence, 99);
    assert_abs_diff_eq!(snap.timestamp.capture_time_secs, 1.0, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(snap.lufs.momentary, -9.03, epsilon = LOUDNESS_LU);
}

#[test]
fn test_probe_rejects_invalid_reconfigure() {
    let probe = test_probe();
    assert!(probe.reconfigure(1000.0).is_err());
    assert_eq!(probe.config().sample_rate, SR);
}

#[derive(Clone, Default)]
struct Recorder {
    non_finite: Arc<Mutex<Vec<(u64, usize)>>>,
}

impl MeterObserver for Recorder {
    fn non_finite_samples(&mut self, sequence: u64, count: usize) {
        self.non_finite.lock().unwrap().push((sequence, count));
    }
}

/// Test that the builder's observer sees sanitised samples.
#[test]
fn test_probe_reports_non_finite_samples() {
    let recorder = Recorder::default();
    let seen = recorder.non_finite.clone();
    let probe = Probe::builder()
        .observer(Box::new(recorder))
        .build()
        .unwrap();
    let handle = probe.handle();
    let mut input = probe.take_input().unwrap();

    let mut left = generate_tone(1000.0, 0.5, SR, 3 * TEST_BLOCK_SIZE);
    let right = left.clone();
    left[TEST_BLOCK_SIZE + 5] = f32::NAN;
    input.push_planar(&left, &right).unwrap();
    assert!(wait_for_blocks(&handle, 3, WAIT_MS));

    assert_eq!(seen.lock().unwrap().as_slice(), &[(1, 1)]);
    assert!(probe.latest().unwrap().lufs.momentary.is_finite());
}

/// Test that dropping the probe stops and joins the metering thread.
#[test]
fn test_probe_drop_stops_thread() {
    let probe = test_probe();
    let handle = probe.handle();
    let input = probe.take_input().unwrap();
    assert!(handle.is_running());

    drop(probe);
    assert!(!handle.is_running());
    assert!(!input.is_connected());
}

/// Test the capture-thread meter with a concurrent reader.
#[test]
fn test_capture_meter_publishes_across_threads() {
    let engine = MeteringEngine::new(MeterConfig::new(SR, TEST_BLOCK_SIZE)).unwrap();
    let mut meter = CaptureMeter::new(engine);
    let handle = meter.handle();

    let reader = std::thread::spawn(move || {
        let mut last_sequence = None;
        let mut observed = 0;
        while observed < 1000 {
            if let Some(snap) = handle.latest() {
                if let Some(prev) = last_sequence {
                    assert!(snap.timestamp.sequence >= prev);
                }
                last_sequence = Some(snap.timestamp.sequence);
            }
            observed += 1;
            std::thread::yield_now();
        }
        handle
    });

    let tone = generate_tone(1000.0, 0.5, SR, TEST_BLOCK_SIZE);
    for _ in 0..300 {
        meter
            .process(&SampleBlock::new(&tone, &tone, SR))
            .unwrap();
    }

    let handle = reader.join().unwrap();
    assert_eq!(handle.blocks_processed(), 300);
    assert_eq!(handle.latest().unwrap().timestamp.sequence, 299);
}
