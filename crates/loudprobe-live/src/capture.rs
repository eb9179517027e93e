//! Metering on the capture thread.
//!
//! For capture sources that already deliver whole blocks on their own thread:
//! the engine runs inline and each snapshot is swapped into shared state for
//! readers holding a [`MeterHandle`].

use crate::handle::MeterHandle;
use crate::live::LiveMeterState;
use crate::Result;
use loudprobe_core::{MeteringContext, MeteringEngine, MetricsSnapshot, SampleBlock};
use std::sync::Arc;

pub struct CaptureMeter {
    engine: MeteringEngine,
    ctx: MeteringContext,
    state: Arc<LiveMeterState>,
}

impl CaptureMeter {
    pub fn new(engine: MeteringEngine) -> Self {
        Self::with_state(engine, Arc::new(LiveMeterState::new()))
    }

    pub fn with_state(engine: MeteringEngine, state: Arc<LiveMeterState>) -> Self {
        Self {
            ctx: MeteringContext::for_engine(&engine),
            engine,
            state,
        }
    }

    pub fn handle(&self) -> MeterHandle {
        MeterHandle::new(self.state.clone())
    }

    pub fn engine(&self) -> &MeteringEngine {
        &self.engine
    }

    /// Meter one planar block and publish the snapshot.
    pub fn process(&mut self, block: &SampleBlock<'_>) -> Result<Arc<MetricsSnapshot>> {
        match self.engine.process(block) {
            Ok(snapshot) => Ok(self.state.publish(snapshot)),
            Err(e) => {
                self.state.record_dropped_block();
                Err(e.into())
            }
        }
    }

    /// Meter one interleaved block and publish the snapshot.
    pub fn process_interleaved(&mut self, interleaved: &[f32]) -> Result<Arc<MetricsSnapshot>> {
        match self.engine.process_interleaved(interleaved, &mut self.ctx) {
            Ok(snapshot) => Ok(self.state.publish(snapshot)),
            Err(e) => {
                self.state.record_dropped_block();
                Err(e.into())
            }
        }
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.state.clear();
    }
}

impl Drop for CaptureMeter {
    fn drop(&mut self) {
        self.state.stop();
    }
}
