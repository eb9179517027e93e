//! Interleaved input path for capture callbacks.

use super::engine::{MeteringEngine, SampleBlock};
use super::snapshot::MetricsSnapshot;
use crate::{Error, Result};

/// Pre-allocated deinterleave buffers for [`MeteringEngine::process_interleaved`].
///
/// Sized for one block at construction; `process_interleaved` never allocates
/// as long as the block size stays the same.
pub struct MeteringContext {
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
}

impl MeteringContext {
    pub fn new(block_size: usize) -> Self {
        Self {
            left_buf: vec![0.0; block_size],
            right_buf: vec![0.0; block_size],
        }
    }

    pub fn for_engine(engine: &MeteringEngine) -> Self {
        Self::new(engine.block_size())
    }

    #[inline]
    fn ensure_len(&mut self, frames: usize) {
        if self.left_buf.len() != frames {
            self.left_buf.resize(frames, 0.0);
            self.right_buf.resize(frames, 0.0);
        }
    }

    #[inline]
    fn deinterleave(&mut self, interleaved: &[f32]) {
        for (i, frame) in interleaved.chunks_exact(2).enumerate() {
            self.left_buf[i] = frame[0];
            self.right_buf[i] = frame[1];
        }
    }
}

impl MeteringEngine {
    /// Meter one block of interleaved stereo (`L R L R ...`) samples.
    pub fn process_interleaved(
        &mut self,
        interleaved: &[f32],
        ctx: &mut MeteringContext,
    ) -> Result<MetricsSnapshot> {
        if interleaved.len() % 2 != 0 {
            return Err(Error::ChannelLengthMismatch {
                left: interleaved.len().div_ceil(2),
                right: interleaved.len() / 2,
            });
        }
        let frames = interleaved.len() / 2;
        if frames != self.block_size() {
            return Err(Error::BlockLengthMismatch {
                expected: self.block_size(),
                actual: frames,
            });
        }

        ctx.ensure_len(frames);
        ctx.deinterleave(interleaved);
        let block = SampleBlock::new(&ctx.left_buf, &ctx.right_buf, self.sample_rate());
        self.process(&block)
    }
}
