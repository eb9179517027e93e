//! Live metering via ring buffer tap.
//!
//! Runs the metering engine on a dedicated thread, reading stereo frames from a
//! SPSC ring buffer fed by the capture callback. Snapshots are published via
//! `ArcSwapOption` for lock-free reads from any thread.

use arc_swap::ArcSwapOption;
use crossbeam_channel::Receiver;
use loudprobe_core::{AtomicCounter, AtomicFlag, MeterConfig, MeteringEngine, MetricsSnapshot, SampleBlock};
use ringbuf::{traits::Consumer, HeapCons};
use std::sync::Arc;
use std::time::Duration;

/// Shared state between the metering thread and `MeterHandle`s.
pub struct LiveMeterState {
    /// Most recent snapshot, `None` until the first block after start or reset.
    pub snapshot: ArcSwapOption<MetricsSnapshot>,
    running: AtomicFlag,
    blocks_processed: AtomicCounter,
    dropped_blocks: AtomicCounter,
    overflow_frames: AtomicCounter,
}

impl Default for LiveMeterState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveMeterState {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            running: AtomicFlag::new(true),
            blocks_processed: AtomicCounter::new(0),
            dropped_blocks: AtomicCounter::new(0),
            overflow_frames: AtomicCounter::new(0),
        }
    }

    /// Signal the metering thread to stop.
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.snapshot.load_full()
    }

    pub fn publish(&self, snapshot: MetricsSnapshot) -> Arc<MetricsSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshot.store(Some(snapshot.clone()));
        self.blocks_processed.add(1);
        snapshot
    }

    pub(crate) fn clear(&self) {
        self.snapshot.store(None);
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.get()
    }

    /// Blocks the engine refused or that were discarded half-assembled on reset.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.get()
    }

    pub(crate) fn record_dropped_block(&self) {
        self.dropped_blocks.add(1);
    }

    /// Frames the capture side could not enqueue because the ring was full.
    pub fn overflow_frames(&self) -> u64 {
        self.overflow_frames.get()
    }

    pub fn record_overflow(&self, frames: usize) {
        self.overflow_frames.add(frames as u64);
    }
}

/// Requests applied by the metering thread between blocks.
///
/// Both commands discard frames still queued in the ring when they are
/// applied, so the new measurement epoch starts with audio pushed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum MeterCommand {
    Reset,
    Reconfigure(MeterConfig),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveConfig {
    /// Ring buffer capacity in stereo frames.
    pub ring_capacity: usize,
    /// Sleep between polls when the ring is empty.
    pub idle_poll: Duration,
}

impl LiveConfig {
    /// One second of audio at `sample_rate`.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self {
            ring_capacity: sample_rate.ceil().max(1.0) as usize,
            ..Self::default()
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 48000,
            idle_poll: Duration::from_millis(2),
        }
    }
}

/// Run the live metering loop.
///
/// Assembles fixed-size blocks from `consumer`, meters each one and publishes
/// the snapshot. Commands are applied only between blocks; a partially
/// assembled block and any frames still queued are discarded on reset or
/// reconfigure.
///
/// This function blocks until `state.stop()` is called or every command sender
/// has been dropped.
pub fn run_meter_thread(
    mut consumer: HeapCons<(f32, f32)>,
    state: Arc<LiveMeterState>,
    mut engine: MeteringEngine,
    commands: Receiver<MeterCommand>,
    config: LiveConfig,
) {
    tracing::debug!(
        sample_rate = engine.sample_rate(),
        block_size = engine.block_size(),
        "metering thread started"
    );

    let mut left: Vec<f32> = Vec::with_capacity(engine.block_size());
    let mut right: Vec<f32> = Vec::with_capacity(engine.block_size());
    let mut drain_buf = vec![(0.0f32, 0.0f32); engine.block_size()];

    while state.is_running() {
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    apply_command(
                        &mut engine,
                        command,
                        &state,
                        &mut consumer,
                        &mut left,
                        &mut right,
                    );
                    if drain_buf.len() != engine.block_size() {
                        drain_buf.resize(engine.block_size(), (0.0, 0.0));
                    }
                }
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    state.stop();
                    break;
                }
            }
        }
        if !state.is_running() {
            break;
        }

        let needed = engine.block_size() - left.len();
        let read = consumer.pop_slice(&mut drain_buf[..needed]);
        if read == 0 {
            std::thread::sleep(config.idle_poll);
            continue;
        }

        for &(l, r) in &drain_buf[..read] {
            left.push(l);
            right.push(r);
        }

        if left.len() == engine.block_size() {
            let block = SampleBlock::new(&left, &right, engine.sample_rate());
            match engine.process(&block) {
                Ok(snapshot) => {
                    state.publish(snapshot);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "metering block rejected");
                    state.record_dropped_block();
                }
            }
            left.clear();
            right.clear();
        }
    }

    tracing::debug!(
        blocks = state.blocks_processed(),
        dropped = state.dropped_blocks(),
        "metering thread stopped"
    );
}

fn apply_command(
    engine: &mut MeteringEngine,
    command: MeterCommand,
    state: &LiveMeterState,
    consumer: &mut HeapCons<(f32, f32)>,
    left: &mut Vec<f32>,
    right: &mut Vec<f32>,
) {
    if !left.is_empty() {
        state.record_dropped_block();
        left.clear();
        right.clear();
    }
    let stale = consumer.clear();
    if stale > 0 {
        tracing::debug!(frames = stale, "discarded queued frames");
    }

    match command {
        MeterCommand::Reset => {
            engine.reset();
            state.clear();
        }
        MeterCommand::Reconfigure(config) => match engine.reconfigure(config) {
            Ok(()) => {
                left.reserve(engine.block_size());
                right.reserve(engine.block_size());
                state.clear();
            }
            Err(e) => tracing::warn!(error = %e, "reconfigure rejected; keeping current configuration"),
        },
    }
}
