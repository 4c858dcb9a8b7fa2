//! EVM account addresses and pool identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 20-byte EVM address, stored as lowercase `0x`-prefixed hex.
///
/// Subgraphs and APIs disagree on checksum casing, so every address is
/// normalised to lowercase on construction. Equality and ordering are then
/// plain string comparisons.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Length of the hex body (without `0x`).
    const HEX_LEN: usize = 40;

    /// Parse and normalise an address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let lower = raw.trim().to_ascii_lowercase();
        let body = lower
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        if body.len() != Self::HEX_LEN || hex::decode(body).is_err() {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(lower))
    }

    /// The zero address, used as the mint/burn sink.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(Self::HEX_LEN)))
    }

    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 32-byte left-padded ABI encoding of this address.
    pub fn abi_word(&self) -> String {
        format!("{:0>64}", &self.0[2..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

/// Identifier of a liquidity pool.
///
/// Registry A keys pools by a 32-byte id (pool address followed by
/// specialization and nonce), registry B keys them by the pool address.
/// Both are kept as lowercase hex strings.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolId(String);

impl PoolId {
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.strip_prefix("0x") {
            Some(body) if !body.is_empty() && body.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Ok(Self(lower))
            }
            _ => Err(TypesError::InvalidPoolId(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PoolId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PoolId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PoolId> for String {
    fn from(p: PoolId) -> Self {
        p.0
    }
}
