//! One epoch computation, end to end.
//!
//! For each sampled block: fetch every pool holding the token, reconcile its
//! share ledger, derive direct ownership, reconcile against the reserve,
//! correct for gauge custody, and fold the result into the accumulator.
//! Blocks are processed strictly in order so a conservation failure always
//! names the block and pool that caused it. Any error aborts the epoch and
//! no weights are produced.

use rings_types::{Address, BlockHeight, PoolSnapshot, Timestamp, WeightRecord};

use crate::aggregator::{direct_contribution, reserve_for, OwnershipAccumulator, PoolContribution};
use crate::conservation::ConservationChecker;
use crate::epoch::EpochWindow;
use crate::gauge;
use crate::normalizer::weight_records;
use crate::sampler::BlockSampler;
use crate::source::{BlockResolver, GaugeSource, PoolSource};
use crate::EngineError;

/// Resolved block bounds of an epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub start: BlockHeight,
    pub end: BlockHeight,
}

impl BlockRange {
    /// Resolve `window` to block heights, cutting a still-running window
    /// off shortly before `now`.
    pub async fn resolve<B: BlockResolver + ?Sized>(
        blocks: &B,
        window: &EpochWindow,
        now: Timestamp,
    ) -> Result<Self, EngineError> {
        let start = blocks.block_at_or_after(window.start).await?;
        let end = blocks.block_at_or_after(window.sampling_end(now)).await?;
        if end < start {
            return Err(EngineError::Config(format!(
                "epoch {} resolves to end block {end} before start block {start}",
                window.cycle
            )));
        }
        Ok(Self { start, end })
    }
}

/// Weights for one token over one epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochWeights {
    pub token: Address,
    pub range: BlockRange,
    pub samples: Vec<BlockHeight>,
    pub records: Vec<WeightRecord>,
}

pub struct EpochRunner<P, G> {
    pools: P,
    gauges: G,
    sampler: BlockSampler,
    checker: ConservationChecker,
}

impl<P: PoolSource, G: GaugeSource> EpochRunner<P, G> {
    pub fn new(pools: P, gauges: G) -> Self {
        Self {
            pools,
            gauges,
            sampler: BlockSampler::default(),
            checker: ConservationChecker::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: BlockSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_checker(mut self, checker: ConservationChecker) -> Self {
        self.checker = checker;
        self
    }

    pub fn sampler(&self) -> &BlockSampler {
        &self.sampler
    }

    pub fn pools(&self) -> &P {
        &self.pools
    }

    /// Sample the range and normalize the accumulated ownership.
    pub async fn compute_weights(
        &self,
        token: &Address,
        range: BlockRange,
    ) -> Result<EpochWeights, EngineError> {
        let samples = self.sampler.sample(range.start, range.end)?;
        tracing::info!(
            %token,
            start = %range.start,
            end = %range.end,
            samples = samples.len(),
            "computing epoch weights"
        );

        let mut accumulator = OwnershipAccumulator::new();
        for block in &samples {
            accumulator = self.accumulate_block(token, *block, accumulator).await?;
        }

        let records = weight_records(accumulator.balances())?;
        tracing::info!(%token, holders = records.len(), "epoch weights normalized");
        Ok(EpochWeights {
            token: token.clone(),
            range,
            samples,
            records,
        })
    }

    /// Add one block's ownership to `accumulator` and hand it back.
    pub async fn accumulate_block(
        &self,
        token: &Address,
        block: BlockHeight,
        mut accumulator: OwnershipAccumulator,
    ) -> Result<OwnershipAccumulator, EngineError> {
        let pools = self.pools.pools_holding_token(token, block).await?;
        tracing::debug!(%block, pools = pools.len(), "sampling block");
        for pool in &pools {
            let contribution = self.pool_contribution(token, block, pool).await?;
            accumulator.absorb(&contribution)?;
        }
        Ok(accumulator)
    }

    /// Checked, gauge-corrected ownership derived from one pool at `block`.
    pub async fn pool_contribution(
        &self,
        token: &Address,
        block: BlockHeight,
        pool: &PoolSnapshot,
    ) -> Result<PoolContribution, EngineError> {
        self.checker.check_shares(pool)?;
        let reserve = reserve_for(token, pool)?;
        let mut contribution = direct_contribution(token, pool)?;
        self.checker.check_reserve(pool, reserve, &contribution)?;

        let Some(gauge_id) = self.gauges.gauge_for_pool(&pool.pool_id).await? else {
            return Ok(contribution);
        };
        let Some(gauge) = self.gauges.gauge_holders(&gauge_id, block).await? else {
            tracing::debug!(
                pool = %pool.pool_id,
                gauge = %gauge_id,
                %block,
                "gauge not indexed at block"
            );
            return Ok(contribution);
        };

        if let Some(correction) = gauge::resolve(pool, reserve, &contribution, &gauge)? {
            self.checker.check_gauge_supply(&gauge)?;
            tracing::debug!(
                pool = %pool.pool_id,
                gauge = %gauge_id,
                %block,
                depositors = correction.credits.len(),
                removed = %correction.removed,
                credited = %correction.credited(),
                "redistributed gauge ownership"
            );
            contribution.apply(&correction);
        }
        Ok(contribution)
    }
}
