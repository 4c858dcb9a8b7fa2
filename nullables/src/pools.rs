//! Nullable pool source: canned snapshots per block.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rings_engine::{EngineError, PoolSource};
use rings_types::{Address, BlockHeight, PoolSnapshot};

/// Serves configured snapshots and records every block it was asked about.
///
/// Snapshots registered for a specific block take precedence over the
/// default set served at every other block.
pub struct NullPools {
    label: String,
    default: Vec<PoolSnapshot>,
    by_block: BTreeMap<BlockHeight, Vec<PoolSnapshot>>,
    failing: Option<BlockHeight>,
    requested: Mutex<Vec<BlockHeight>>,
}

impl NullPools {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            default: Vec::new(),
            by_block: BTreeMap::new(),
            failing: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Serve `pools` at every block without a specific entry.
    pub fn with_default(mut self, pools: Vec<PoolSnapshot>) -> Self {
        self.default = pools;
        self
    }

    /// Serve `pools` at exactly `block`.
    pub fn with_block(mut self, block: BlockHeight, pools: Vec<PoolSnapshot>) -> Self {
        self.by_block.insert(block, pools);
        self
    }

    /// Fail the fetch at `block` as a broken transport would.
    pub fn failing_at(mut self, block: BlockHeight) -> Self {
        self.failing = Some(block);
        self
    }

    /// Blocks requested so far, in request order.
    pub fn requested(&self) -> Vec<BlockHeight> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PoolSource for NullPools {
    fn variant(&self) -> &str {
        &self.label
    }

    async fn pools_holding_token(
        &self,
        _token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolSnapshot>, EngineError> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(block);
        if self.failing == Some(block) {
            return Err(EngineError::Data(format!(
                "{}: connection reset fetching block {block}",
                self.label
            )));
        }
        let pools = self.by_block.get(&block).unwrap_or(&self.default);
        Ok(pools.clone())
    }
}
