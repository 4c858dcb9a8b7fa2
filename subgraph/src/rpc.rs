//! Historical ERC-20 balances over JSON-RPC.

use std::time::Duration;

use async_trait::async_trait;
use rings_engine::{EngineError, ReserveReader};
use rings_types::{Address, BlockHeight, U256};
use serde::Deserialize;
use serde_json::json;

use crate::error::SubgraphError;

/// `balanceOf(address)` selector.
const BALANCE_OF_SELECTOR: &str = "70a08231";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads balances with `eth_call` pinned to a block.
pub struct RpcReserveReader {
    http_client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcReserveReader {
    pub fn new(url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: url.into(),
        }
    }

    async fn call(&self, body: serde_json::Value) -> Result<String, SubgraphError> {
        let response = self.http_client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SubgraphError::RequestFailed(format!(
                "HTTP status {} from {}",
                response.status(),
                self.url
            )));
        }
        let parsed: RpcResponse = response.json().await.map_err(|e| {
            SubgraphError::InvalidResponse(format!("failed to parse RPC response: {e}"))
        })?;
        into_result(parsed)
    }
}

fn balance_of_request(token: &Address, holder: &Address, block: BlockHeight) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_call",
        "params": [
            {
                "to": token.as_str(),
                "data": format!("0x{BALANCE_OF_SELECTOR}{}", holder.abi_word()),
            },
            format!("0x{:x}", block.get()),
        ],
    })
}

fn into_result(response: RpcResponse) -> Result<String, SubgraphError> {
    if let Some(err) = response.error {
        return Err(SubgraphError::RequestFailed(format!(
            "RPC error {}: {}",
            err.code, err.message
        )));
    }
    response
        .result
        .ok_or_else(|| SubgraphError::InvalidResponse("RPC response has no result".into()))
}

/// Decode a single `uint256` return word. An empty return reads as zero.
fn decode_uint(word: &str) -> Result<U256, SubgraphError> {
    let hex = word.strip_prefix("0x").unwrap_or(word);
    if hex.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(hex, 16)
        .map_err(|e| SubgraphError::InvalidResponse(format!("balance word {word:?}: {e}")))
}

#[async_trait]
impl ReserveReader for RpcReserveReader {
    async fn balance_of(
        &self,
        token: &Address,
        holder: &Address,
        block: BlockHeight,
    ) -> Result<U256, EngineError> {
        let word = self.call(balance_of_request(token, holder, block)).await?;
        Ok(decode_uint(&word)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_pins_block_and_encodes_holder() {
        let token = Address::parse("0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae").unwrap();
        let vault = Address::parse("0xBA12222222228d8Ba445958a75a0704d566BF2C8").unwrap();
        let req = balance_of_request(&token, &vault, BlockHeight::new(255));
        assert_eq!(req["method"], "eth_call");
        assert_eq!(req["params"][1], "0xff");
        assert_eq!(
            req["params"][0]["data"],
            "0x70a08231000000000000000000000000ba12222222228d8ba445958a75a0704d566bf2c8"
        );
    }

    #[test]
    fn decodes_return_word() {
        let word = "0x00000000000000000000000000000000000000000000000000000000000f4240";
        assert_eq!(decode_uint(word).unwrap(), U256::new(1_000_000));
        assert_eq!(decode_uint("0x").unwrap(), U256::ZERO);
        assert!(decode_uint("0xzz").is_err());
    }

    #[test]
    fn rpc_error_is_request_failure() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "id": 1,
                "error": {"code": -32000, "message": "header not found"}}"#,
        )
        .unwrap();
        assert!(matches!(into_result(resp), Err(SubgraphError::RequestFailed(_))));
    }
}
