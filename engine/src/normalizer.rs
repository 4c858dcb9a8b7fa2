//! Fixed-point weight normalization.
//!
//! Accumulated balances become weights scaled by 10^36 that sum to exactly
//! one unit. Each weight is `floor(balance * 10^36 / total)`; the truncation
//! remainder is applied in full to the last key in iteration order.

use std::collections::BTreeMap;

use rings_types::amount::pow10;
use rings_types::{Address, U256, WeightRecord, PRECISION_DECIMALS};

use crate::EngineError;

/// `10^36`, one whole weight unit.
pub fn weight_unit() -> U256 {
    pow10(PRECISION_DECIMALS)
}

/// Normalize `balances` into weights summing to exactly [`weight_unit`].
///
/// Output order is the map's order (ascending key).
pub fn normalize<K: Ord + Clone + std::fmt::Display>(
    balances: &BTreeMap<K, U256>,
) -> Result<Vec<(K, U256)>, EngineError> {
    let one = weight_unit();
    let total = balances.values().try_fold(U256::ZERO, |acc, b| acc.checked_add(*b));
    let total = match total {
        Some(t) if t > U256::ZERO => t,
        Some(_) => {
            return Err(EngineError::Data(
                "no ownership accumulated for the epoch".into(),
            ))
        }
        None => return Err(EngineError::Data("accumulated balances overflowed".into())),
    };

    let mut weights = Vec::with_capacity(balances.len());
    for (key, balance) in balances {
        let scaled = balance
            .checked_mul(one)
            .ok_or_else(|| EngineError::Data(format!("balance of {key} too large to normalize")))?;
        weights.push((key.clone(), scaled / total));
    }

    let sum = weights.iter().fold(U256::ZERO, |acc, (_, w)| acc + *w);
    if let Some((last, weight)) = weights.last_mut() {
        if sum < one {
            let remainder = one - sum;
            tracing::debug!(%last, %remainder, "adding truncation remainder to last entry");
            *weight += remainder;
        } else if sum > one {
            let excess = sum - one;
            tracing::warn!(%last, %excess, "deducting weight excess from last entry");
            *weight = weight.checked_sub(excess).ok_or_else(|| EngineError::Normalization {
                expected: one.to_string(),
                actual: sum.to_string(),
            })?;
        }
    }

    let sum_after = weights.iter().fold(U256::ZERO, |acc, (_, w)| acc + *w);
    if sum_after != one {
        return Err(EngineError::Normalization {
            expected: one.to_string(),
            actual: sum_after.to_string(),
        });
    }
    Ok(weights)
}

/// Normalize an address-keyed balance map into output records.
pub fn weight_records(
    balances: &BTreeMap<Address, U256>,
) -> Result<Vec<WeightRecord>, EngineError> {
    Ok(normalize(balances)?
        .into_iter()
        .map(|(user, weight)| WeightRecord { user, weight })
        .collect())
}
