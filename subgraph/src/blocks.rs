//! Timestamp to block resolution through a blocks subgraph.

use async_trait::async_trait;
use rings_engine::{BlockResolver, EngineError};
use rings_types::{BlockHeight, Timestamp};
use serde::Deserialize;

use crate::client::GraphClient;
use crate::error::SubgraphError;

pub struct SubgraphBlocks {
    client: GraphClient,
}

#[derive(Debug, Deserialize)]
struct BlocksData {
    blocks: Vec<BlockRow>,
}

#[derive(Debug, Deserialize)]
struct BlockRow {
    number: String,
}

impl SubgraphBlocks {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

fn block_query(timestamp: Timestamp) -> String {
    format!(
        "{{ blocks(first: 1, orderBy: number, orderDirection: asc, \
         where: {{timestamp_gte: {}}}) {{ number }} }}",
        timestamp.as_secs()
    )
}

fn first_block(data: BlocksData, timestamp: Timestamp) -> Result<BlockHeight, SubgraphError> {
    let row = data.blocks.into_iter().next().ok_or_else(|| {
        SubgraphError::InvalidResponse(format!("no block indexed at or after {timestamp}"))
    })?;
    row.number
        .parse::<u64>()
        .map(BlockHeight::new)
        .map_err(|e| SubgraphError::InvalidResponse(format!("block number {:?}: {e}", row.number)))
}

#[async_trait]
impl BlockResolver for SubgraphBlocks {
    async fn block_at_or_after(&self, timestamp: Timestamp) -> Result<BlockHeight, EngineError> {
        let data: BlocksData = self.client.query(&block_query(timestamp)).await?;
        let block = first_block(data, timestamp)?;
        tracing::debug!(%timestamp, %block, "resolved block");
        Ok(block)
    }
}
