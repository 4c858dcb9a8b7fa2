//! Epoch block sampler.
//!
//! Turns the resolved `[start, end]` block range of an epoch into the fixed
//! cadence of heights the engine takes snapshots at.

use rings_types::BlockHeight;

use crate::EngineError;

/// Default number of strides per epoch (every three hours over a week).
pub const DEFAULT_SAMPLES_PER_EPOCH: u64 = 56;

/// Upper bound on strides per epoch (one per minute over a week).
pub const MAX_SAMPLES_PER_EPOCH: u64 = 10_080;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSampler {
    samples_per_epoch: u64,
}

impl BlockSampler {
    pub fn new(samples_per_epoch: u64) -> Result<Self, EngineError> {
        if samples_per_epoch == 0 {
            return Err(EngineError::Config(
                "samples per epoch must be at least 1".into(),
            ));
        }
        if samples_per_epoch > MAX_SAMPLES_PER_EPOCH {
            return Err(EngineError::Config(format!(
                "samples per epoch must be at most {MAX_SAMPLES_PER_EPOCH}"
            )));
        }
        Ok(Self { samples_per_epoch })
    }

    pub fn samples_per_epoch(&self) -> u64 {
        self.samples_per_epoch
    }

    /// `floor((end - start) / samples)`, clamped to at least one block.
    pub fn stride(&self, start: BlockHeight, end: BlockHeight) -> Result<u64, EngineError> {
        let span = end.blocks_since(start).ok_or_else(|| {
            EngineError::Config(format!("end block {end} is before start block {start}"))
        })?;
        Ok((span / self.samples_per_epoch).max(1))
    }

    /// Heights `start, start + stride, ...` up to and including the first
    /// height at or past `end`. The final height may overshoot `end` by
    /// less than one stride.
    pub fn sample(
        &self,
        start: BlockHeight,
        end: BlockHeight,
    ) -> Result<Vec<BlockHeight>, EngineError> {
        let stride = self.stride(start, end)?;
        let span = end.blocks_since(start).unwrap_or(0);
        let expected = usize::try_from(span / stride).unwrap_or(0).saturating_add(2);
        let mut heights = Vec::with_capacity(expected);
        let mut current = start;
        loop {
            heights.push(current);
            if current >= end {
                break;
            }
            current = current.saturating_add(stride);
        }
        Ok(heights)
    }
}

impl Default for BlockSampler {
    fn default() -> Self {
        Self {
            samples_per_epoch: DEFAULT_SAMPLES_PER_EPOCH,
        }
    }
}
