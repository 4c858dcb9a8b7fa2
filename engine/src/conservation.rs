//! Conservation checks gating an epoch run.
//!
//! Each pool snapshot must reconcile within one whole unit:
//! - holder share balances against the pool's reported total shares
//!   (catches pagination or indexing gaps upstream);
//! - computed per-holder ownership against the pool's token reserve
//!   (catches denominator or rounding errors in aggregation);
//! - gauge depositor balances against the gauge's total supply.

use rings_types::{FixedDecimal, GaugeSnapshot, HolderShare, PoolSnapshot, U256, WAD_DECIMALS};

use crate::aggregator::PoolContribution;
use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConservationChecker {
    tolerance: FixedDecimal,
}

impl ConservationChecker {
    pub fn new(tolerance: FixedDecimal) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> FixedDecimal {
        self.tolerance
    }

    /// Sum of holder balances vs `pool.total_shares`.
    pub fn check_shares(&self, pool: &PoolSnapshot) -> Result<(), EngineError> {
        let held = sum_balances(&pool.holders)?;
        self.compare(
            format!("pool {} total shares", pool.pool_id),
            pool.total_shares,
            held,
        )
    }

    /// Sum of computed ownership vs the pool's token reserve.
    pub fn check_reserve(
        &self,
        pool: &PoolSnapshot,
        reserve: FixedDecimal,
        contribution: &PoolContribution,
    ) -> Result<(), EngineError> {
        let owned = FixedDecimal::from_raw(contribution.total(), WAD_DECIMALS);
        self.compare(
            format!("pool {} token balance", pool.pool_id),
            reserve,
            owned,
        )
    }

    /// Sum of depositor balances vs the gauge's total supply.
    pub fn check_gauge_supply(&self, gauge: &GaugeSnapshot) -> Result<(), EngineError> {
        let deposited = sum_balances(&gauge.holders)?;
        self.compare(
            format!("gauge {} total supply", gauge.gauge_id),
            gauge.total_supply,
            deposited,
        )
    }

    fn compare(
        &self,
        context: String,
        expected: FixedDecimal,
        actual: FixedDecimal,
    ) -> Result<(), EngineError> {
        if expected.within(actual, self.tolerance)? {
            Ok(())
        } else {
            Err(EngineError::conservation(context, expected, actual))
        }
    }
}

impl Default for ConservationChecker {
    /// One whole token unit at 18 decimals.
    fn default() -> Self {
        Self::new(FixedDecimal::one(WAD_DECIMALS))
    }
}

fn sum_balances(holders: &[HolderShare]) -> Result<FixedDecimal, EngineError> {
    let raw = holders
        .iter()
        .try_fold(U256::ZERO, |acc, h| acc.checked_add(h.balance.raw()))
        .ok_or_else(|| EngineError::Data("holder balances overflowed".into()))?;
    Ok(FixedDecimal::from_raw(raw, WAD_DECIMALS))
}
