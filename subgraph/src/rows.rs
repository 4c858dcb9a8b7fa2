//! Wire rows shared by the registry and gauge sources.
//!
//! Subgraphs report decimal amounts as strings (`BigDecimal`); they are
//! parsed here at 18 decimals, truncating any further digits.

use rings_types::{Address, FixedDecimal, HolderShare, TokenReserve, WAD_DECIMALS};
use serde::Deserialize;

use crate::error::SubgraphError;

pub(crate) const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Deserialize)]
pub(crate) struct IdRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenRow {
    pub address: String,
    pub balance: String,
}

impl TokenRow {
    pub fn to_reserve(&self) -> Result<TokenReserve, SubgraphError> {
        Ok(TokenReserve {
            token: address(&self.address)?,
            balance: amount(&self.balance)?,
        })
    }
}

pub(crate) fn reserves(tokens: &[TokenRow]) -> Result<Vec<TokenReserve>, SubgraphError> {
    tokens.iter().map(TokenRow::to_reserve).collect()
}

pub(crate) fn address(raw: &str) -> Result<Address, SubgraphError> {
    Address::parse(raw).map_err(|e| SubgraphError::InvalidResponse(e.to_string()))
}

pub(crate) fn amount(raw: &str) -> Result<FixedDecimal, SubgraphError> {
    FixedDecimal::parse(raw, WAD_DECIMALS)
        .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))
}

pub(crate) fn holder(user: &str, balance: &str) -> Result<HolderShare, SubgraphError> {
    Ok(HolderShare::new(address(user)?, amount(balance)?))
}

/// Rows that carry their own `id` page through it.
macro_rules! impl_cursor {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::client::Cursor for $ty {
            fn cursor(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_cursor!(IdRef);
pub(crate) use impl_cursor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_rows_parse_mixed_case_addresses() {
        let row: TokenRow = serde_json::from_str(
            r#"{"address": "0xD3DCe716f3eF535C5Ff8d041c1A41C3bd89b97aE", "balance": "1234.5"}"#,
        )
        .unwrap();
        let reserve = row.to_reserve().unwrap();
        assert_eq!(reserve.token.as_str(), "0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae");
        assert_eq!(reserve.balance.to_string(), "1234.5");
    }

    #[test]
    fn malformed_amount_is_invalid_response() {
        assert!(matches!(amount("twelve"), Err(SubgraphError::InvalidResponse(_))));
    }
}
