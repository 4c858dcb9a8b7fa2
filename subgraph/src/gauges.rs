//! Gauge lookups: pool → gauge through the pools API, depositors through the
//! gauges subgraph.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rings_engine::{EngineError, GaugeSource};
use rings_types::{Address, BlockHeight, GaugeSnapshot, HolderShare, PoolId};
use serde::Deserialize;

use crate::client::{id_list, paginate, GraphClient, DEFAULT_PAGE_SIZE};
use crate::error::SubgraphError;
use crate::rows::{self, impl_cursor, IdRef};

/// Chain filter passed to the pools API.
pub const DEFAULT_CHAIN: &str = "SONIC";

pub struct SubgraphGauges {
    api: GraphClient,
    gauges: GraphClient,
    chain: String,
    page_size: usize,
    /// Pool → gauge links never change within a run.
    links: Mutex<HashMap<PoolId, Option<Address>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPoolsData {
    pool_get_pools: Vec<ApiPool>,
}

#[derive(Debug, Deserialize)]
struct ApiPool {
    id: String,
    staking: Option<ApiStaking>,
}

#[derive(Debug, Deserialize)]
struct ApiStaking {
    gauge: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GaugeData {
    liquidity_gauge: Option<GaugeRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GaugeRow {
    total_supply: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GaugeSharesData {
    gauge_shares: Vec<GaugeShareRow>,
}

#[derive(Debug, Deserialize)]
struct GaugeShareRow {
    id: String,
    balance: String,
    user: IdRef,
}

impl_cursor!(GaugeShareRow);

impl SubgraphGauges {
    /// `api` serves `poolGetPools`; `gauges` is the gauges subgraph.
    pub fn new(api: GraphClient, gauges: GraphClient) -> Self {
        Self {
            api,
            gauges,
            chain: DEFAULT_CHAIN.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            links: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn cached_link(&self, pool: &PoolId) -> Option<Option<Address>> {
        self.links
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(pool)
            .cloned()
    }

    async fn lookup_gauge(&self, pool: &PoolId) -> Result<Option<Address>, SubgraphError> {
        let data: ApiPoolsData = self
            .api
            .query(&api_pools_query(&self.chain, &[pool.as_str()]))
            .await?;
        gauge_link(data, pool)
    }

    async fn depositors(
        &self,
        gauge: &Address,
        block: BlockHeight,
    ) -> Result<Vec<GaugeShareRow>, SubgraphError> {
        paginate(self.page_size, |cursor| {
            let query = gauge_shares_query(gauge, block, &cursor, self.page_size);
            async move {
                let data: GaugeSharesData = self.gauges.query(&query).await?;
                Ok::<_, SubgraphError>(data.gauge_shares)
            }
        })
        .await
    }
}

fn api_pools_query(chain: &str, pools: &[&str]) -> String {
    format!(
        "{{ poolGetPools(where: {{chainIn: [{chain}], idIn: {ids}}}) \
         {{ id staking {{ gauge {{ id }} }} }} }}",
        ids = id_list(pools.iter().copied()),
    )
}

fn gauge_query(gauge: &Address, block: BlockHeight) -> String {
    format!(
        "{{ liquidityGauge(id: \"{gauge}\", block: {{number: {block}}}) {{ totalSupply }} }}",
        block = block.get(),
    )
}

fn gauge_shares_query(gauge: &Address, block: BlockHeight, cursor: &str, first: usize) -> String {
    format!(
        "{{ gaugeShares(first: {first}, orderBy: id, orderDirection: asc, block: {{number: {block}}}, \
         where: {{id_gt: \"{cursor}\", gauge: \"{gauge}\", balance_gt: 0}}) \
         {{ id balance user {{ id }} }} }}",
        block = block.get(),
    )
}

fn gauge_link(data: ApiPoolsData, pool: &PoolId) -> Result<Option<Address>, SubgraphError> {
    let Some(found) = data
        .pool_get_pools
        .into_iter()
        .find(|p| p.id.eq_ignore_ascii_case(pool.as_str()))
    else {
        return Ok(None);
    };
    match found.staking.and_then(|s| s.gauge) {
        Some(gauge) => rows::address(&gauge.id).map(Some),
        None => Ok(None),
    }
}

fn to_snapshot(
    gauge: &Address,
    row: GaugeRow,
    shares: Vec<GaugeShareRow>,
) -> Result<GaugeSnapshot, SubgraphError> {
    let holders = shares
        .iter()
        .map(|s| rows::holder(&s.user.id, &s.balance))
        .collect::<Result<Vec<HolderShare>, _>>()?;
    Ok(GaugeSnapshot {
        gauge_id: gauge.clone(),
        total_supply: rows::amount(&row.total_supply)?,
        holders,
    })
}

#[async_trait]
impl GaugeSource for SubgraphGauges {
    async fn gauge_for_pool(&self, pool: &PoolId) -> Result<Option<Address>, EngineError> {
        if let Some(link) = self.cached_link(pool) {
            return Ok(link);
        }
        let link = self.lookup_gauge(pool).await?;
        tracing::debug!(%pool, gauge = ?link.as_ref().map(Address::as_str), "looked up pool gauge");
        self.links
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pool.clone(), link.clone());
        Ok(link)
    }

    async fn gauge_holders(
        &self,
        gauge: &Address,
        block: BlockHeight,
    ) -> Result<Option<GaugeSnapshot>, EngineError> {
        let data: GaugeData = self.gauges.query(&gauge_query(gauge, block)).await?;
        let Some(row) = data.liquidity_gauge else {
            return Ok(None);
        };
        let shares = self.depositors(gauge, block).await?;
        Ok(Some(to_snapshot(gauge, row, shares)?))
    }
}
