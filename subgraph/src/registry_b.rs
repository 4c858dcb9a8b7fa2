//! Registry B: the v3 pool registry.
//!
//! The share ledger is flat: one row per `(pool, holder)` with the pool's
//! totals and token balances repeated on every row.

use async_trait::async_trait;
use rings_engine::snapshot::group_share_rows;
use rings_engine::{EngineError, PoolShareRow, PoolSource};
use rings_types::{Address, BlockHeight, PoolId, PoolSnapshot};
use serde::Deserialize;

use crate::client::{id_list, paginate, GraphClient, DEFAULT_PAGE_SIZE};
use crate::error::SubgraphError;
use crate::rows::{self, impl_cursor, IdRef, TokenRow, ZERO_ADDRESS};

pub struct RegistryB {
    client: GraphClient,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct PoolIdsData {
    pools: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharesData {
    pool_shares: Vec<ShareRow>,
}

#[derive(Debug, Deserialize)]
struct ShareRow {
    id: String,
    balance: String,
    user: IdRef,
    pool: PoolRow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    id: String,
    total_shares: String,
    tokens: Vec<TokenRow>,
}

impl_cursor!(ShareRow);

impl RegistryB {
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

    async fn pool_ids(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<IdRef>, SubgraphError> {
        paginate(self.page_size, |cursor| {
            let query = pool_ids_query(token, block, &cursor, self.page_size);
            async move {
                let data: PoolIdsData = self.client.query(&query).await?;
                Ok::<_, SubgraphError>(data.pools)
            }
        })
        .await
    }

    async fn shares(
        &self,
        pools: &[IdRef],
        block: BlockHeight,
    ) -> Result<Vec<ShareRow>, SubgraphError> {
        let ids = id_list(pools.iter().map(|p| p.id.as_str()));
        paginate(self.page_size, |cursor| {
            let query = shares_query(&ids, block, &cursor, self.page_size);
            async move {
                let data: SharesData = self.client.query(&query).await?;
                Ok::<_, SubgraphError>(data.pool_shares)
            }
        })
        .await
    }
}

fn pool_ids_query(token: &Address, block: BlockHeight, cursor: &str, first: usize) -> String {
    format!(
        "{{ pools(first: {first}, orderBy: id, orderDirection: asc, block: {{number: {block}}}, \
         where: {{id_gt: \"{cursor}\", tokens_: {{address_in: [\"{token}\"]}}}}) {{ id }} }}",
        block = block.get(),
    )
}

fn shares_query(pool_ids: &str, block: BlockHeight, cursor: &str, first: usize) -> String {
    format!(
        "{{ poolShares(first: {first}, orderBy: id, orderDirection: asc, block: {{number: {block}}}, \
         where: {{id_gt: \"{cursor}\", pool_in: {pool_ids}, balance_gt: 0, \
         user_: {{id_not: \"{ZERO_ADDRESS}\"}}}}) \
         {{ id balance user {{ id }} pool {{ id totalShares tokens {{ address balance }} }} }} }}",
        block = block.get(),
    )
}

fn to_row(share: &ShareRow) -> Result<PoolShareRow, SubgraphError> {
    let holder = rows::holder(&share.user.id, &share.balance)?;
    Ok(PoolShareRow {
        pool_id: PoolId::parse(&share.pool.id)
            .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?,
        total_shares: rows::amount(&share.pool.total_shares)?,
        tokens: rows::reserves(&share.pool.tokens)?,
        holder: holder.holder,
        balance: holder.balance,
    })
}

#[async_trait]
impl PoolSource for RegistryB {
    fn variant(&self) -> &str {
        "registry-b"
    }

    async fn pools_holding_token(
        &self,
        token: &Address,
        block: BlockHeight,
    ) -> Result<Vec<PoolSnapshot>, EngineError> {
        let pools = self.pool_ids(token, block).await?;
        if pools.is_empty() {
            return Ok(Vec::new());
        }
        let shares = self.shares(&pools, block).await?;
        let rows = shares.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        group_share_rows(rows)
    }
}
