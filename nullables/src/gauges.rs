//! Nullable gauge source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rings_engine::{EngineError, GaugeSource};
use rings_types::{Address, BlockHeight, GaugeSnapshot, PoolId};

/// Pool-to-gauge links plus gauge snapshots, either per block or for every
/// block.
#[derive(Default)]
pub struct NullGauges {
    links: BTreeMap<PoolId, Address>,
    default: BTreeMap<Address, GaugeSnapshot>,
    by_block: BTreeMap<(Address, BlockHeight), GaugeSnapshot>,
}

impl NullGauges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `pool` to the gauge in `snapshot` and serve that snapshot at
    /// every block.
    pub fn with_gauge(mut self, pool: PoolId, snapshot: GaugeSnapshot) -> Self {
        self.links.insert(pool, snapshot.gauge_id.clone());
        self.default.insert(snapshot.gauge_id.clone(), snapshot);
        self
    }

    /// Link `pool` to `gauge` without serving any snapshot.
    pub fn with_link(mut self, pool: PoolId, gauge: Address) -> Self {
        self.links.insert(pool, gauge);
        self
    }

    /// Serve `snapshot` for its gauge at exactly `block`.
    pub fn with_block(mut self, block: BlockHeight, snapshot: GaugeSnapshot) -> Self {
        self.by_block
            .insert((snapshot.gauge_id.clone(), block), snapshot);
        self
    }
}

#[async_trait]
impl GaugeSource for NullGauges {
    async fn gauge_for_pool(&self, pool: &PoolId) -> Result<Option<Address>, EngineError> {
        Ok(self.links.get(pool).cloned())
    }

    async fn gauge_holders(
        &self,
        gauge: &Address,
        block: BlockHeight,
    ) -> Result<Option<GaugeSnapshot>, EngineError> {
        Ok(self
            .by_block
            .get(&(gauge.clone(), block))
            .or_else(|| self.default.get(gauge))
            .cloned())
    }
}
