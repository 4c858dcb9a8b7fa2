//! Points derived from weights.
//!
//! `points = weight * averageReserve * 36 * 7`, where `averageReserve` is
//! the vault's balance of the token summed over the sampled blocks and
//! divided by the nominal sample count. This is reporting output only and
//! is computed in floating point.

use rings_types::{
    Address, BlockHeight, FixedDecimal, PointsRecord, WeightRecord, PRECISION_DECIMALS, U256,
};

use crate::source::ReserveReader;
use crate::EngineError;

/// Points accrued per token per day, times the days in a cycle.
pub const POINTS_MULTIPLIER: f64 = 36.0 * 7.0;

/// The vault's average balance of `token` over `blocks`, in raw token
/// units.
///
/// The sum is divided by `samples_per_epoch`, not by `blocks.len()`.
pub async fn average_reserve<R: ReserveReader + ?Sized>(
    reader: &R,
    token: &Address,
    vault: &Address,
    blocks: &[BlockHeight],
    samples_per_epoch: u64,
) -> Result<U256, EngineError> {
    if samples_per_epoch == 0 {
        return Err(EngineError::Config("samples per epoch must be at least 1".into()));
    }
    let mut sum = U256::ZERO;
    for block in blocks {
        let balance = reader.balance_of(token, vault, *block).await?;
        sum = sum
            .checked_add(balance)
            .ok_or_else(|| EngineError::Data(format!("vault balance of {token} overflowed")))?;
    }
    Ok(sum / U256::from(samples_per_epoch))
}

/// Points for every weight record, in record order.
pub fn derive_points(
    weights: &[WeightRecord],
    average_raw: U256,
    token_decimals: u8,
) -> Vec<PointsRecord> {
    let average = FixedDecimal::from_raw(average_raw, token_decimals).to_f64();
    weights
        .iter()
        .map(|w| {
            let fraction = FixedDecimal::from_raw(w.weight, PRECISION_DECIMALS).to_f64();
            PointsRecord {
                user: w.user.clone(),
                points: (fraction * average * POINTS_MULTIPLIER).to_string(),
            }
        })
        .collect()
}
