//! Normalising and merging pool snapshots across registry variants.
//!
//! Registry A reports pools with their holder lists nested inside; registry
//! B reports one flat row per `(pool, holder)` with the pool's totals
//! repeated on each row. Both end up as [`PoolSnapshot`]s here, and the
//! variants are merged into a single pool-id space feeding one accumulator.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use rings_types::{
    Address, BlockHeight, FixedDecimal, HolderShare, PoolId, PoolSnapshot, TokenReserve,
};

use crate::source::PoolSource;
use crate::EngineError;

/// One `(pool, holder)` row as reported by a flat share registry.
#[derive(Clone, Debug)]
pub struct PoolShareRow {
    pub pool_id: PoolId,
    pub total_shares: FixedDecimal,
    pub tokens: Vec<TokenReserve>,
    pub holder: Address,
    pub balance: FixedDecimal,
}

/// Group flat share rows into per-pool snapshots.
///
/// Pools keep the order in which they were first seen, holders keep row
/// order. Rows for the same pool must agree on the pool's total shares.
pub fn group_share_rows(rows: Vec<PoolShareRow>) -> Result<Vec<PoolSnapshot>, EngineError> {
    let mut order: Vec<PoolId> = Vec::new();
    let mut pools: BTreeMap<PoolId, PoolSnapshot> = BTreeMap::new();

    for row in rows {
        match pools.get_mut(&row.pool_id) {
            Some(pool) => {
                if pool.total_shares != row.total_shares {
                    return Err(EngineError::Data(format!(
                        "pool {} reported total shares {} and {} in the same snapshot",
                        row.pool_id, pool.total_shares, row.total_shares
                    )));
                }
                pool.holders.push(HolderShare::new(row.holder, row.balance));
            }
            None => {
                order.push(row.pool_id.clone());
                pools.insert(
                    row.pool_id.clone(),
                    PoolSnapshot {
                        pool_id: row.pool_id,
                        total_shares: row.total_shares,
                        tokens: row.tokens,
                        holders: vec![HolderShare::new(row.holder, row.balance)],
                    },
                );
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| pools.remove(&id))
        .collect())
}

/// Drop zero-address and non-positive holder entries.
///
/// Sources are expected to filter these already; this keeps the aggregator
/// honest when one does not.
pub fn sanitize(mut pool: PoolSnapshot) -> PoolSnapshot {
    pool.holders
        .retain(|h| !h.holder.is_zero() && !h.balance.is_zero());
    pool
}

/// Merges several registry variants into one stream of pool snapshots.
///
/// Variants are queried in the order they were added. A pool id reported by
/// more than one variant at the same block is a data error: merging into a
/// single accumulator relies on ids being globally unique.
pub struct MergedPoolSource {
    variants: Vec<Box<dyn PoolSource>>,
}

impl MergedPoolSource {
    pub fn new() -> Self {
        Self {
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, source: impl PoolSource + 'static) -> Self {
        self.variants.push(Box::new(source));
        self
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}

impl Default for MergedPoolSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoolSource for MergedPoolSource {
    fn variant(&self) -> &str {
        "merged"
    }

    async fn pools_holding_token(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolSnapshot>, EngineError> {
        let mut merged = Vec::new();
        let mut seen: HashSet<PoolId> = HashSet::new();

        for source in &self.variants {
            let pools = source.pools_holding_token(token, block).await?;
            tracing::debug!(
                variant = source.variant(),
                %block,
                pools = pools.len(),
                "fetched pool snapshots"
            );
            for pool in pools {
                if !seen.insert(pool.pool_id.clone()) {
                    return Err(EngineError::Data(format!(
                        "pool {} reported by more than one registry at block {block}",
                        pool.pool_id
                    )));
                }
                merged.push(sanitize(pool));
            }
        }
        Ok(merged)
    }
}
