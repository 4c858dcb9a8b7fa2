//! Terminal output records.
//!
//! Weights are serialized as base-10 integer strings at
//! [`PRECISION_DECIMALS`](crate::PRECISION_DECIMALS) so consumers never
//! round-trip them through a float.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, PoolId};

/// One address's share of an epoch, scaled by 10^36.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub user: Address,
    #[serde(with = "u256_decimal")]
    pub weight: U256,
}

/// One pool's share of an epoch, scaled by 10^36.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolWeightRecord {
    pub pool_id: PoolId,
    #[serde(with = "u256_decimal")]
    pub weight: U256,
}

/// Points derived from a weight and the epoch's average reserve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsRecord {
    pub user: Address,
    pub points: String,
}

mod u256_decimal {
    use ethnum::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}
