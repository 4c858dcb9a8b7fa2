//! Nullable block resolver: a chain with a fixed block time.

use async_trait::async_trait;
use rings_engine::{BlockResolver, EngineError};
use rings_types::{BlockHeight, Timestamp};

/// Block `n` is produced at `genesis + n * block_time`.
pub struct NullBlocks {
    genesis: Timestamp,
    block_time_secs: u64,
}

impl NullBlocks {
    pub fn new(genesis: Timestamp, block_time_secs: u64) -> Self {
        Self {
            genesis,
            block_time_secs: block_time_secs.max(1),
        }
    }
}

#[async_trait]
impl BlockResolver for NullBlocks {
    async fn block_at_or_after(&self, timestamp: Timestamp) -> Result<BlockHeight, EngineError> {
        if timestamp < self.genesis {
            return Ok(BlockHeight::GENESIS);
        }
        let elapsed = self.genesis.elapsed_since(timestamp);
        Ok(BlockHeight::new(elapsed.div_ceil(self.block_time_secs)))
    }
}
