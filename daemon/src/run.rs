//! One run: resolve the epoch, compute every requested token, persist.

use std::time::Instant;

use rings_engine::points::{average_reserve, derive_points};
use rings_engine::pool_weights::compute_pool_weights;
use rings_engine::{
    BlockRange, BlockResolver, BlockSampler, CycleSelector, EpochRunner, EpochWindow, GaugeSource,
    PoolSource, ReserveReader,
};
use rings_types::{PointsRecord, PoolWeightRecord, Timestamp, WeightRecord};
use rings_utils::{format_elapsed, format_utc};

use crate::config::RingsConfig;
use crate::error::DaemonError;
use crate::output;

/// The epoch being computed, resolved to blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedEpoch {
    pub window: EpochWindow,
    pub range: BlockRange,
}

/// Everything produced for one token.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenReport {
    pub token: String,
    pub cycle: u64,
    pub weights: Vec<WeightRecord>,
    pub points: Option<Vec<PointsRecord>>,
}

pub async fn resolve_epoch<B: BlockResolver + ?Sized>(
    config: &RingsConfig,
    blocks: &B,
    selector: CycleSelector,
    now: Timestamp,
) -> Result<ResolvedEpoch, DaemonError> {
    let window = config.epochs.schedule().window(selector, now)?;
    let range = BlockRange::resolve(blocks, &window, now).await?;
    if !window.is_complete(now) {
        tracing::warn!(
            cycle = window.cycle,
            "cycle has not ended yet, sampling up to two hours ago"
        );
    }
    tracing::info!(
        cycle = window.cycle,
        start = %format_utc(window.start.as_secs()),
        end = %format_utc(window.end.as_secs()),
        start_block = %range.start,
        end_block = %range.end,
        "resolved epoch"
    );
    Ok(ResolvedEpoch { window, range })
}

/// Weights (and points, where enabled) for the token called `name`.
pub async fn token_report<P, G, R>(
    config: &RingsConfig,
    runner: &EpochRunner<P, G>,
    reserves: &R,
    epoch: &ResolvedEpoch,
    name: &str,
) -> Result<TokenReport, DaemonError>
where
    P: PoolSource,
    G: GaugeSource,
    R: ReserveReader + ?Sized,
{
    let (name, token) = config.token(name)?;
    let started = Instant::now();
    tracing::info!(token = name, cycle = epoch.window.cycle, "running token");

    let weights = runner.compute_weights(&token.address, epoch.range).await?;

    let points = if token.points {
        let average = average_reserve(
            reserves,
            &token.address,
            &config.vault,
            &weights.samples,
            config.samples_per_epoch,
        )
        .await?;
        tracing::info!(token = name, average = %average, "average vault balance");
        Some(derive_points(&weights.records, average, token.decimals))
    } else {
        None
    };

    tracing::info!(
        token = name,
        holders = weights.records.len(),
        elapsed = %format_elapsed(started.elapsed()),
        "token done"
    );
    Ok(TokenReport {
        token: name.to_string(),
        cycle: epoch.window.cycle,
        weights: weights.records,
        points,
    })
}

/// Pool-level weights for the token called `name`.
pub async fn pool_weight_report<P: PoolSource + ?Sized>(
    config: &RingsConfig,
    pools: &P,
    epoch: &ResolvedEpoch,
    name: &str,
) -> Result<Vec<PoolWeightRecord>, DaemonError> {
    let (name, token) = config.token(name)?;
    let sampler = BlockSampler::new(config.samples_per_epoch)?;
    let weights =
        compute_pool_weights(pools, &sampler, &token.address, epoch.range.start, epoch.range.end)
            .await?;
    for w in &weights {
        tracing::info!(token = name, pool = %w.pool_id, weight = %w.weight, "pool weight");
    }
    Ok(weights)
}

/// Write a token report to the configured output directory.
pub fn persist(config: &RingsConfig, report: &TokenReport) -> Result<(), DaemonError> {
    output::write_records(
        &config.output_dir,
        &output::weights_file_name(report.cycle, &report.token),
        &report.weights,
    )?;
    if let Some(points) = &report.points {
        output::write_records(
            &config.output_dir,
            &output::points_file_name(report.cycle, &report.token),
            points,
        )?;
    }
    Ok(())
}
