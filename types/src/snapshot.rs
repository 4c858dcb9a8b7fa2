//! Pool and gauge state at one block height.
//!
//! Snapshots are produced by a snapshot source for a `(token, block)` pair,
//! consumed by the aggregator and then dropped. All decimal fields are
//! carried at [`WAD_DECIMALS`](crate::WAD_DECIMALS).

use crate::{Address, FixedDecimal, PoolId};

/// One holder's share balance in a pool or gauge.
///
/// Sources only emit strictly positive balances and never the zero address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HolderShare {
    pub holder: Address,
    pub balance: FixedDecimal,
}

impl HolderShare {
    pub fn new(holder: Address, balance: FixedDecimal) -> Self {
        Self { holder, balance }
    }
}

/// Balance of one token held by a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenReserve {
    pub token: Address,
    pub balance: FixedDecimal,
}

/// A liquidity pool at one block height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pool_id: PoolId,
    pub total_shares: FixedDecimal,
    pub tokens: Vec<TokenReserve>,
    pub holders: Vec<HolderShare>,
}

impl PoolSnapshot {
    /// The pool's reserve of `token`, if the pool holds it.
    pub fn reserve_of(&self, token: &Address) -> Option<FixedDecimal> {
        self.tokens
            .iter()
            .find(|t| &t.token == token)
            .map(|t| t.balance)
    }

    /// The share balance recorded for `holder`, if any.
    pub fn balance_of(&self, holder: &Address) -> Option<FixedDecimal> {
        self.holders
            .iter()
            .find(|h| &h.holder == holder)
            .map(|h| h.balance)
    }
}

/// A staking gauge at one block height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaugeSnapshot {
    pub gauge_id: Address,
    pub total_supply: FixedDecimal,
    pub holders: Vec<HolderShare>,
}

impl GaugeSnapshot {
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
