//! Collaborator contracts consumed by the engine.
//!
//! The engine never talks to a subgraph or RPC node directly. Everything it
//! needs from the outside world is expressed as one of these traits; the
//! `rings-subgraph` crate provides network-backed implementations and
//! `rings-nullables` provides in-memory ones for tests.
//!
//! Implementations paginate to completion internally and do not retry. Any
//! failure is reported as [`EngineError::Data`] and aborts the epoch.

use async_trait::async_trait;
use rings_types::{Address, BlockHeight, GaugeSnapshot, PoolId, PoolSnapshot, Timestamp, U256};

use crate::EngineError;

/// Resolves wall-clock timestamps to block heights.
#[async_trait]
pub trait BlockResolver: Send + Sync {
    /// The first block whose timestamp is at or after `timestamp`.
    async fn block_at_or_after(&self, timestamp: Timestamp) -> Result<BlockHeight, EngineError>;
}

/// One registry of pools (a protocol variant).
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Short label used in logs, e.g. `"registry-a"`.
    fn variant(&self) -> &str;

    /// Every pool holding `token` at `block`, each with its complete holder
    /// list. Holder lists exclude the zero address and zero balances.
    async fn pools_holding_token(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolSnapshot>, EngineError>;
}

/// Staking gauges that custody pool shares.
#[async_trait]
pub trait GaugeSource: Send + Sync {
    /// The gauge staking `pool`'s shares, if the pool has one.
    async fn gauge_for_pool(&self, pool: &PoolId) -> Result<Option<Address>, EngineError>;

    /// The gauge's depositors and total supply at `block`, or `None` if the
    /// gauge is not indexed at that height.
    async fn gauge_holders(
        &self,
        gauge: &Address,
        block: BlockHeight,
    ) -> Result<Option<GaugeSnapshot>, EngineError>;
}

/// Reads raw ERC-20 balances at historical blocks.
#[async_trait]
pub trait ReserveReader: Send + Sync {
    /// `token.balanceOf(holder)` at `block`, in the token's raw units.
    async fn balance_of(
        &self,
        token: &Address,
        holder: &Address,
        block: BlockHeight,
    ) -> Result<U256, EngineError>;
}

/// A source with no gauges at all.
pub struct NoGauges;

#[async_trait]
impl GaugeSource for NoGauges {
    async fn gauge_for_pool(&self, _pool: &PoolId) -> Result<Option<Address>, EngineError> {
        Ok(None)
    }

    async fn gauge_holders(
        &self,
        _gauge: &Address,
        _block: BlockHeight,
    ) -> Result<Option<GaugeSnapshot>, EngineError> {
        Ok(None)
    }
}
