//! Read-only view of a live meter.

use crate::live::LiveMeterState;
use loudprobe_core::MetricsSnapshot;
use std::sync::Arc;

/// Cloneable handle for reading the latest snapshot from any thread.
#[derive(Clone)]
pub struct MeterHandle {
    state: Arc<LiveMeterState>,
}

impl MeterHandle {
    pub fn new(state: Arc<LiveMeterState>) -> Self {
        Self { state }
    }

    /// Latest published snapshot, or `None` before the first block.
    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.state.latest()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn blocks_processed(&self) -> u64 {
        self.state.blocks_processed()
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.state.dropped_blocks()
    }

    pub fn overflow_frames(&self) -> u64 {
        self.state.overflow_frames()
    }
}

impl std::fmt::Debug for MeterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeterHandle")
            .field("running", &self.is_running())
            .field("blocks_processed", &self.blocks_processed())
            .finish()
    }
}
