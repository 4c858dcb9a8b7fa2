//! Pool-level weights.
//!
//! Instead of splitting a pool's reserve among its holders, each pool is
//! credited with its whole reserve of the token at every sampled block.
//! Pools at or below the cutoff share are dropped and the survivors are
//! renormalized from their raw balances.

use std::collections::BTreeMap;

use rings_types::amount::pow10;
use rings_types::{Address, BlockHeight, PoolId, PoolWeightRecord, U256};

use crate::aggregator::reserve_for;
use crate::normalizer::normalize;
use crate::sampler::BlockSampler;
use crate::source::PoolSource;
use crate::EngineError;

/// 1% of one weight unit.
pub fn default_cutoff() -> U256 {
    pow10(34)
}

/// Sum of each pool's token reserve across `blocks`.
pub async fn accumulate_pool_reserves<P: PoolSource + ?Sized>(
    pools: &P,
    token: &Address,
    blocks: &[BlockHeight],
) -> Result<BTreeMap<PoolId, U256>, EngineError> {
    let mut held: BTreeMap<PoolId, U256> = BTreeMap::new();
    for block in blocks {
        for pool in pools.pools_holding_token(token, *block).await? {
            let reserve = reserve_for(token, &pool)?;
            let entry = held.entry(pool.pool_id.clone()).or_insert(U256::ZERO);
            *entry = entry.checked_add(reserve.raw()).ok_or_else(|| {
                EngineError::Data(format!("reserve of pool {} overflowed", pool.pool_id))
            })?;
        }
    }
    Ok(held)
}

/// Normalize pool reserves, drop pools whose weight is not above `cutoff`,
/// and renormalize the rest.
pub fn filtered_pool_weights(
    reserves: &BTreeMap<PoolId, U256>,
    cutoff: U256,
) -> Result<Vec<PoolWeightRecord>, EngineError> {
    let first_pass = normalize(reserves)?;

    let mut kept: BTreeMap<PoolId, U256> = BTreeMap::new();
    for (pool_id, weight) in first_pass {
        if weight > cutoff {
            if let Some(balance) = reserves.get(&pool_id) {
                kept.insert(pool_id, *balance);
            }
        } else {
            tracing::info!(pool = %pool_id, %weight, "dropping pool at or below weight cutoff");
        }
    }
    if kept.is_empty() {
        return Err(EngineError::Config(
            "no pool is above the weight cutoff".into(),
        ));
    }

    Ok(normalize(&kept)?
        .into_iter()
        .map(|(pool_id, weight)| PoolWeightRecord { pool_id, weight })
        .collect())
}

/// Sample `[start, end]`, accumulate pool reserves and produce filtered
/// pool weights.
pub async fn compute_pool_weights<P: PoolSource + ?Sized>(
    pools: &P,
    sampler: &BlockSampler,
    token: &Address,
    start: BlockHeight,
    end: BlockHeight,
) -> Result<Vec<PoolWeightRecord>, EngineError> {
    let samples = sampler.sample(start, end)?;
    let reserves = accumulate_pool_reserves(pools, token, &samples).await?;
    filtered_pool_weights(&reserves, default_cutoff())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::weight_unit;

    fn pool(n: u8) -> PoolId {
        PoolId::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn small_pools_are_dropped_and_rest_renormalized() {
        let reserves = BTreeMap::from([
            (pool(1), U256::new(600)),
            (pool(2), U256::new(395)),
            (pool(3), U256::new(5)),
        ]);
        let weights = filtered_pool_weights(&reserves, default_cutoff()).unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].pool_id, pool(1));
        assert_eq!(weights[1].pool_id, pool(2));
        let sum = weights.iter().fold(U256::ZERO, |acc, w| acc + w.weight);
        assert_eq!(sum, weight_unit());
        // 600 / 995 of the unit, plus the remainder on the last pool only
        assert_eq!(weights[0].weight, U256::new(600) * weight_unit() / U256::new(995));
    }

    #[test]
    fn exactly_one_percent_is_dropped() {
        let reserves = BTreeMap::from([(pool(1), U256::new(99)), (pool(2), U256::new(1))]);
        let weights = filtered_pool_weights(&reserves, default_cutoff()).unwrap();
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[0].weight, weight_unit());
    }

    #[test]
    fn nothing_above_cutoff_is_config_error() {
        let reserves = BTreeMap::from([(pool(1), U256::new(1))]);
        let err = filtered_pool_weights(&reserves, weight_unit()).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
