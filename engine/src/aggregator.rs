//! Proportional-ownership aggregation.
//!
//! For every sampled block and every pool holding the token, each holder
//! owns `reserve * (shares / totalShares)` of the token. The per-pool result
//! is built as a [`PoolContribution`] first, corrected for gauge custody,
//! and only then folded into the epoch's [`OwnershipAccumulator`].
//!
//! Amounts are raw integers at 18 decimals.

use std::collections::BTreeMap;

use rings_types::{Address, FixedDecimal, PoolId, PoolSnapshot, U256, WAD_DECIMALS};

use crate::gauge::GaugeCorrection;
use crate::EngineError;

/// Token ownership accumulated over one epoch computation.
///
/// Iteration order is ascending address. Each epoch/token run owns its own
/// accumulator; nothing here is shared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnershipAccumulator {
    balances: BTreeMap<Address, U256>,
}

impl OwnershipAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `holder`'s running balance.
    pub fn credit(&mut self, holder: &Address, amount: U256) -> Result<(), EngineError> {
        let entry = self.balances.entry(holder.clone()).or_insert(U256::ZERO);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            EngineError::Data(format!("ownership of {holder} overflowed"))
        })?;
        Ok(())
    }

    /// Fold one pool/block contribution into the running totals.
    pub fn absorb(&mut self, contribution: &PoolContribution) -> Result<(), EngineError> {
        for (holder, amount) in &contribution.owned {
            self.credit(holder, *amount)?;
        }
        Ok(())
    }

    pub fn balance(&self, holder: &Address) -> U256 {
        self.balances.get(holder).copied().unwrap_or(U256::ZERO)
    }

    pub fn contains(&self, holder: &Address) -> bool {
        self.balances.contains_key(holder)
    }

    pub fn total(&self) -> U256 {
        self.balances.values().fold(U256::ZERO, |acc, v| acc + *v)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn balances(&self) -> &BTreeMap<Address, U256> {
        &self.balances
    }

    pub fn into_balances(self) -> BTreeMap<Address, U256> {
        self.balances
    }
}

/// Token ownership derived from one pool at one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolContribution {
    pub pool_id: PoolId,
    owned: BTreeMap<Address, U256>,
}

impl PoolContribution {
    pub fn empty(pool_id: PoolId) -> Self {
        Self {
            pool_id,
            owned: BTreeMap::new(),
        }
    }

    fn add(&mut self, holder: &Address, amount: U256) {
        *self.owned.entry(holder.clone()).or_insert(U256::ZERO) += amount;
    }

    pub fn owned_by(&self, holder: &Address) -> U256 {
        self.owned.get(holder).copied().unwrap_or(U256::ZERO)
    }

    pub fn contains(&self, holder: &Address) -> bool {
        self.owned.contains_key(holder)
    }

    pub fn total(&self) -> U256 {
        self.owned.values().fold(U256::ZERO, |acc, v| acc + *v)
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.owned.iter()
    }

    /// Apply a gauge correction: the gauge's entry is dropped and its
    /// depositors are credited instead.
    pub fn apply(&mut self, correction: &GaugeCorrection) {
        self.owned.remove(&correction.gauge);
        for (holder, amount) in &correction.credits {
            self.add(holder, *amount);
        }
    }
}

/// `reserve * round18(shares / totalShares)`, truncated, as raw 18-decimal
/// units.
///
/// The fraction is cut to 18 digits before the multiplication; reconciliation
/// tolerances assume that order.
pub fn token_share(
    reserve: FixedDecimal,
    shares: FixedDecimal,
    total_shares: FixedDecimal,
) -> Result<U256, EngineError> {
    let fraction = FixedDecimal::ratio_truncated(shares, total_shares, WAD_DECIMALS)?;
    Ok(reserve.mul_truncated(fraction)?.raw())
}

/// The pool's reserve of `token`.
pub fn reserve_for(token: &Address, pool: &PoolSnapshot) -> Result<FixedDecimal, EngineError> {
    pool.reserve_of(token).ok_or_else(|| {
        EngineError::Data(format!(
            "token {token} balance not found in pool {}",
            pool.pool_id
        ))
    })
}

/// Direct ownership of `token` by every holder of `pool`, before any gauge
/// correction.
pub fn direct_contribution(
    token: &Address,
    pool: &PoolSnapshot,
) -> Result<PoolContribution, EngineError> {
    let reserve = reserve_for(token, pool)?;
    if pool.total_shares.is_zero() {
        return Err(EngineError::Data(format!(
            "pool {} reports zero total shares",
            pool.pool_id
        )));
    }

    let mut contribution = PoolContribution::empty(pool.pool_id.clone());
    for share in pool.holders.iter().filter(|h| !h.balance.is_zero()) {
        let owned = token_share(reserve, share.balance, pool.total_shares)?;
        contribution.add(&share.holder, owned);
    }
    Ok(contribution)
}
