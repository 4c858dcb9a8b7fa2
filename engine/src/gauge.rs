//! Gauge delegation resolution.
//!
//! A staking gauge appears in a pool's holder list as a single address
//! holding every staked share. The real beneficiaries are the gauge's
//! depositors, so the gauge's direct ownership is replaced by one credit per
//! depositor worth `reserve * depositorBalance / pool.totalShares`.
//!
//! The pool's share ledger is the denominator, not the gauge's own supply:
//! gauge shares back pool shares 1:1.

use rings_types::{Address, FixedDecimal, GaugeSnapshot, PoolSnapshot, U256};

use crate::aggregator::{token_share, PoolContribution};
use crate::EngineError;

/// The net change gauge resolution makes to one pool/block contribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaugeCorrection {
    /// The gauge address whose direct ownership is withdrawn.
    pub gauge: Address,
    /// What the gauge directly owned for this pool/block.
    pub removed: U256,
    /// Ownership handed to each depositor, in gauge holder order.
    pub credits: Vec<(Address, U256)>,
}

impl GaugeCorrection {
    pub fn credited(&self) -> U256 {
        self.credits.iter().fold(U256::ZERO, |acc, (_, v)| acc + *v)
    }
}

/// Compute the correction for `pool` given its gauge's snapshot at the same
/// block.
///
/// Returns `None` when the gauge has no depositors; the gauge then keeps its
/// direct ownership. A gauge with depositors that does not itself hold pool
/// shares is a data error, since crediting its depositors would count the
/// same shares twice.
pub fn resolve(
    pool: &PoolSnapshot,
    reserve: FixedDecimal,
    direct: &PoolContribution,
    gauge: &GaugeSnapshot,
) -> Result<Option<GaugeCorrection>, EngineError> {
    if gauge.is_empty() {
        return Ok(None);
    }
    if pool.balance_of(&gauge.gauge_id).is_none() {
        return Err(EngineError::Data(format!(
            "gauge {} has depositors but holds no shares of pool {}",
            gauge.gauge_id, pool.pool_id
        )));
    }

    let mut credits = Vec::with_capacity(gauge.holders.len());
    for deposit in gauge.holders.iter().filter(|h| !h.balance.is_zero()) {
        let owned = token_share(reserve, deposit.balance, pool.total_shares)?;
        credits.push((deposit.holder.clone(), owned));
    }

    Ok(Some(GaugeCorrection {
        gauge: gauge.gauge_id.clone(),
        removed: direct.owned_by(&gauge.gauge_id),
        credits,
    }))
}
