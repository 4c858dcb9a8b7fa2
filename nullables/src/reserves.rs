//! Nullable balance reader.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rings_engine::{EngineError, ReserveReader};
use rings_types::{Address, BlockHeight, U256};

/// Serves a fixed balance per block, falling back to a constant.
pub struct NullReserves {
    constant: U256,
    by_block: BTreeMap<BlockHeight, U256>,
}

impl NullReserves {
    pub fn constant(balance: U256) -> Self {
        Self {
            constant: balance,
            by_block: BTreeMap::new(),
        }
    }

    pub fn with_block(mut self, block: BlockHeight, balance: U256) -> Self {
        self.by_block.insert(block, balance);
        self
    }
}

#[async_trait]
impl ReserveReader for NullReserves {
    async fn balance_of(
        &self,
        _token: &Address,
        _holder: &Address,
        block: BlockHeight,
    ) -> Result<U256, EngineError> {
        Ok(self.by_block.get(&block).copied().unwrap_or(self.constant))
    }
}
