//! Probe that runs the metering engine on its own thread.

use crate::{ProbeBuilder, Result};
use crossbeam_channel::{bounded, Sender};
use loudprobe_core::{MeterConfig, MeterObserver, MeteringEngine, MetricsSnapshot};
use loudprobe_live::{run_meter_thread, LiveConfig, LiveMeterState, MeterCommand, MeterHandle};
use parking_lot::Mutex;
use ringbuf::{
    traits::{Producer, Split},
    HeapProd, HeapRb,
};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Commands queued ahead of the metering thread.
const COMMAND_CAPACITY: usize = 16;

/// Live broadcast meter.
///
/// Owns a metering thread fed through a lock-free ring buffer. The capture side
/// writes with a [`CaptureInput`]; any number of readers poll [`Probe::latest`]
/// or a cloned [`MeterHandle`].
///
/// # Example
///
/// ```ignore
/// use loudprobe::prelude::*;
///
/// let probe = Probe::builder().probe("tx-1").build()?;
/// let mut input = probe.take_input().unwrap();
///
/// // capture callback
/// input.push_interleaved(&buffer);
///
/// // UI thread
/// if let Some(snapshot) = probe.latest() {
///     println!("{:.1} LUFS", snapshot.lufs.short_term);
/// }
/// ```
pub struct Probe {
    state: Arc<LiveMeterState>,
    commands: Sender<MeterCommand>,
    input: Mutex<Option<CaptureInput>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    config: Mutex<MeterConfig>,
}

impl Probe {
    pub fn builder() -> ProbeBuilder {
        ProbeBuilder::default()
    }

    pub(crate) fn start(
        config: MeterConfig,
        live: LiveConfig,
        observer: Box<dyn MeterObserver>,
    ) -> Result<Self> {
        let engine = MeteringEngine::with_observer(config.clone(), observer)?;

        let rb = HeapRb::<(f32, f32)>::new(live.ring_capacity);
        let (producer, consumer) = rb.split();
        let state = Arc::new(LiveMeterState::new());
        let (commands, rx) = bounded(COMMAND_CAPACITY);

        let state2 = state.clone();
        let thread = std::thread::Builder::new()
            .name("loudprobe-meter".into())
            .spawn(move || {
                run_meter_thread(consumer, state2, engine, rx, live);
            })
            .map_err(loudprobe_live::Error::ThreadSpawn)?;

        Ok(Self {
            input: Mutex::new(Some(CaptureInput::new(producer, state.clone()))),
            state,
            commands,
            thread: Mutex::new(Some(thread)),
            config: Mutex::new(config),
        })
    }

    /// Take the capture-side writer. Returns `None` once it has been taken.
    pub fn take_input(&self) -> Option<CaptureInput> {
        self.input.lock().take()
    }

    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.state.latest()
    }

    pub fn handle(&self) -> MeterHandle {
        MeterHandle::new(self.state.clone())
    }

    pub fn config(&self) -> MeterConfig {
        self.config.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Clear all measurement state before the next block.
    pub fn reset(&self) -> Result<()> {
        self.send(MeterCommand::Reset)
    }

    /// Switch to a new capture sample rate, keeping the block duration.
    ///
    /// The new configuration is validated here; the metering thread rebuilds
    /// its engine between blocks.
    pub fn reconfigure(&self, sample_rate: f64) -> Result<()> {
        let mut guard = self.config.lock();
        let block_secs = guard.block_duration();
        let config = MeterConfig {
            sample_rate,
            block_size: (block_secs * sample_rate).round() as usize,
            ..guard.clone()
        };
        config.validate()?;

        self.send(MeterCommand::Reconfigure(config.clone()))?;
        tracing::debug!(sample_rate, block_size = config.block_size, "reconfigure requested");
        *guard = config;
        Ok(())
    }

    /// Stop the metering thread and wait for it to exit.
    pub fn stop(&self) {
        self.state.stop();
        if let Some(thread) = self.thread.lock().take() {
            let _ = thread.join();
        }
    }

    fn send(&self, command: MeterCommand) -> Result<()> {
        if !self.state.is_running() {
            return Err(loudprobe_live::Error::Disconnected.into());
        }
        self.commands
            .send(command)
            .map_err(|_| loudprobe_live::Error::Disconnected.into())
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Capture-side writer into the metering ring buffer.
///
/// Never blocks: frames that do not fit are dropped and counted.
pub struct CaptureInput {
    producer: HeapProd<(f32, f32)>,
    state: Arc<LiveMeterState>,
    overflowing: bool,
}

impl CaptureInput {
    fn new(producer: HeapProd<(f32, f32)>, state: Arc<LiveMeterState>) -> Self {
        Self {
            producer,
            state,
            overflowing: false,
        }
    }

    /// Push interleaved stereo (`L R L R ...`). Returns frames accepted.
    ///
    /// A trailing unpaired sample is ignored.
    pub fn push_interleaved(&mut self, samples: &[f32]) -> usize {
        let frames = samples.len() / 2;
        let accepted = self
            .producer
            .push_iter(samples.chunks_exact(2).map(|f| (f[0], f[1])));
        self.account(frames, accepted);
        accepted
    }

    /// Push planar stereo. Returns frames accepted.
    pub fn push_planar(&mut self, left: &[f32], right: &[f32]) -> Result<usize> {
        if left.len() != right.len() {
            return Err(loudprobe_core::Error::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            }
            .into());
        }
        let accepted = self
            .producer
            .push_iter(left.iter().copied().zip(right.iter().copied()));
        self.account(left.len(), accepted);
        Ok(accepted)
    }

    /// Whether the metering thread is still consuming.
    pub fn is_connected(&self) -> bool {
        self.state.is_running()
    }

    fn account(&mut self, offered: usize, accepted: usize) {
        let dropped = offered - accepted;
        if dropped > 0 {
            self.state.record_overflow(dropped);
            if !self.overflowing {
                tracing::warn!(dropped, "capture ring full; dropping frames");
            }
        }
        self.overflowing = dropped > 0;
    }
}
