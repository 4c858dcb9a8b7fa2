//! Registry A: the v2 pool registry.
//!
//! Pools are listed first, then each pool's share ledger is paged through
//! separately so pools with more than one page of holders are complete.

use async_trait::async_trait;
use rings_engine::{EngineError, PoolSource};
use rings_types::{Address, BlockHeight, HolderShare, PoolId, PoolSnapshot};
use serde::Deserialize;

use crate::client::{paginate, GraphClient, DEFAULT_PAGE_SIZE};
use crate::error::SubgraphError;
use crate::rows::{self, impl_cursor, IdRef, TokenRow, ZERO_ADDRESS};

pub struct RegistryA {
    client: GraphClient,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct PoolsData {
    pools: Vec<PoolRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    id: String,
    total_shares: String,
    tokens: Vec<TokenRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharesData {
    pool_shares: Vec<ShareRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareRow {
    id: String,
    balance: String,
    user_address: IdRef,
}

impl_cursor!(PoolRow, ShareRow);

impl RegistryA {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn pools(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolRow>, SubgraphError> {
        paginate(self.page_size, |cursor| {
            let query = pools_query(token, block, &cursor, self.page_size);
            async move {
                let data: PoolsData = self.client.query(&query).await?;
                Ok::<_, SubgraphError>(data.pools)
            }
        })
        .await
    }

    async fn shares(&self, pool: &str, block: BlockHeight) -> Result<Vec<ShareRow>, SubgraphError> {
        paginate(self.page_size, |cursor| {
            let query = shares_query(pool, block, &cursor, self.page_size);
            async move {
                let data: SharesData = self.client.query(&query).await?;
                Ok::<_, SubgraphError>(data.pool_shares)
            }
        })
        .await
    }
}

fn pools_query(token: &Address, block: BlockHeight, cursor: &str, first: usize) -> String {
    format!(
        "{{ pools(first: {first}, orderBy: id, orderDirection: asc, block: {{number: {block}}}, \
         where: {{id_gt: \"{cursor}\", tokensList_contains_nocase: [\"{token}\"], totalShares_gt: 0}}) \
         {{ id totalShares tokens {{ address balance }} }} }}",
        block = block.get(),
    )
}

fn shares_query(pool: &str, block: BlockHeight, cursor: &str, first: usize) -> String {
    format!(
        "{{ poolShares(first: {first}, orderBy: id, orderDirection: asc, block: {{number: {block}}}, \
         where: {{id_gt: \"{cursor}\", poolId: \"{pool}\", balance_gt: 0, \
         userAddress_: {{id_not: \"{ZERO_ADDRESS}\"}}}}) \
         {{ id balance userAddress {{ id }} }} }}",
        block = block.get(),
    )
}

fn to_snapshot(pool: PoolRow, shares: Vec<ShareRow>) -> Result<PoolSnapshot, SubgraphError> {
    let holders = shares
        .iter()
        .map(|s| rows::holder(&s.user_address.id, &s.balance))
        .collect::<Result<Vec<HolderShare>, _>>()?;
    Ok(PoolSnapshot {
        pool_id: PoolId::parse(&pool.id)
            .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?,
        total_shares: rows::amount(&pool.total_shares)?,
        tokens: rows::reserves(&pool.tokens)?,
        holders,
    })
}

#[async_trait]
impl PoolSource for RegistryA {
    fn variant(&self) -> &str {
        "registry-a"
    }

    async fn pools_holding_token(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolSnapshot>, EngineError> {
        let pools = self.pools(token, block).await?;
        let mut snapshots = Vec::with_capacity(pools.len());
        for pool in pools {
            let shares = self.shares(&pool.id, block).await?;
            snapshots.push(to_snapshot(pool, shares)?);
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_ID: &str = "0x374641076b68371e69d03c417dac3e5f236c32fa000000000000000000000006";

    #[test]
    fn pools_query_filters_token_and_block() {
        let token = Address::parse("0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae").unwrap();
        let q = pools_query(&token, BlockHeight::new(42), "0xabc", 1000);
        assert!(q.contains("block: {number: 42}"));
        assert!(q.contains("id_gt: \"0xabc\""));
        assert!(q.contains(
            "tokensList_contains_nocase: [\"0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae\"]"
        ));
        assert!(q.contains("first: 1000"));
    }

    #[test]
    fn shares_query_excludes_zero_holder() {
        let q = shares_query(POOL_ID, BlockHeight::new(7), "", 500);
        assert!(q.contains(ZERO_ADDRESS));
        assert!(q.contains("balance_gt: 0"));
        assert!(q.contains(&format!("poolId: \"{POOL_ID}\"")));
    }

    #[test]
    fn nested_rows_become_a_snapshot() {
        let pools: PoolsData = serde_json::from_str(&format!(
            r#"{{"pools": [{{"id": "{POOL_ID}", "totalShares": "100.5",
                "tokens": [{{"address": "0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae", "balance": "2500"}}]}}]}}"#
        ))
        .unwrap();
        let shares: SharesData = serde_json::from_str(
            r#"{"poolShares": [
                {"id": "a-1", "balance": "60.5", "userAddress": {"id": "0x0000000000000000000000000000000000000001"}},
                {"id": "a-2", "balance": "40", "userAddress": {"id": "0x0000000000000000000000000000000000000002"}}
            ]}"#,
        )
        .unwrap();

        let pool = pools.pools.into_iter().next().unwrap();
        let snapshot = to_snapshot(pool, shares.pool_shares).unwrap();
        assert_eq!(snapshot.pool_id.as_str(), POOL_ID);
        assert_eq!(snapshot.total_shares.to_string(), "100.5");
        assert_eq!(snapshot.holders.len(), 2);
        assert_eq!(snapshot.holders[0].balance.to_string(), "60.5");
        assert_eq!(snapshot.tokens[0].balance.to_string(), "2500");
    }
}
