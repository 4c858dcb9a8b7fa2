//! Rings weight runner: computes per-epoch liquidity weights for configured
//! tokens from pool registries and writes (and optionally submits) them.

mod config;
mod error;
mod output;
mod run;
mod submit;

use std::path::PathBuf;

use clap::Parser;
use rings_engine::{BlockSampler, CycleSelector, EpochRunner, MergedPoolSource};
use rings_subgraph::{
    GraphClient, RegistryA, RegistryB, RpcReserveReader, SubgraphBlocks, SubgraphGauges,
};
use rings_types::{FixedDecimal, Timestamp, PRECISION_DECIMALS};
use rings_utils::LogFormat;

use crate::config::{RingsConfig, SubmissionConfig};
use crate::run::ResolvedEpoch;
use crate::submit::Submitter;

#[derive(Parser)]
#[command(name = "rings-daemon", about = "Rings liquidity weight runner")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "RINGS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "RINGS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "RINGS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// API key for the subgraph gateway.
    #[arg(long, env = "RINGS_GRAPH_API_KEY", hide_env_values = true)]
    graph_api_key: Option<String>,

    /// JSON-RPC endpoint for historical balances.
    #[arg(long, env = "RINGS_RPC_URL")]
    rpc_url: Option<String>,

    /// Directory result files are written to.
    #[arg(long, env = "RINGS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// POST results to this URL after writing them.
    #[arg(long, env = "RINGS_SUBMIT_URL")]
    submit_url: Option<String>,

    /// Sampling strides per epoch.
    #[arg(long, env = "RINGS_SAMPLES_PER_EPOCH")]
    samples_per_epoch: Option<u64>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Per-holder weights, plus points for tokens that earn them.
    Weights {
        /// Cycle to compute; defaults to the current one.
        #[arg(long)]
        cycle: Option<u64>,

        /// Token names (comma-separated); defaults to every configured token.
        #[arg(long = "token", value_delimiter = ',')]
        tokens: Vec<String>,
    },
    /// Pool-level weights from registry B, small pools filtered out.
    PoolWeights {
        /// Cycle to compute; defaults to the current one.
        #[arg(long)]
        cycle: Option<u64>,

        #[arg(long)]
        token: String,
    },
    /// Print the effective configuration as TOML and exit.
    ShowConfig,
}

impl Cli {
    fn apply(&self, config: &mut RingsConfig) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(key) = &self.graph_api_key {
            config.subgraph.api_key = key.clone();
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(url) = &self.submit_url {
            let expected_status = config.submission.as_ref().map_or(200, |s| s.expected_status);
            config.submission = Some(SubmissionConfig {
                url: url.clone(),
                expected_status,
            });
        }
        if let Some(samples) = self.samples_per_epoch {
            config.samples_per_epoch = samples;
        }
    }
}

fn selector(cycle: Option<u64>) -> CycleSelector {
    cycle.map_or(CycleSelector::Current, CycleSelector::Cycle)
}

fn graph(config: &RingsConfig, deployment: &str) -> GraphClient {
    GraphClient::new(config.subgraph.endpoint(deployment))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RingsConfig::from_toml_file(path)?,
        None => RingsConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    rings_utils::init_tracing(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    if let Command::ShowConfig = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    if config.subgraph.api_key.is_empty() {
        anyhow::bail!(
            "no subgraph API key configured (set RINGS_GRAPH_API_KEY or subgraph.api_key)"
        );
    }

    let now = Timestamp::now();
    let blocks = SubgraphBlocks::new(graph(&config, &config.subgraph.blocks_deployment));

    match cli.command {
        Command::Weights { cycle, tokens } => {
            let epoch = run::resolve_epoch(&config, &blocks, selector(cycle), now).await?;
            run_weights(&config, &epoch, tokens).await?;
        }
        Command::PoolWeights { cycle, token } => {
            let epoch = run::resolve_epoch(&config, &blocks, selector(cycle), now).await?;
            run_pool_weights(&config, &epoch, &token).await?;
        }
        Command::ShowConfig => {}
    }
    Ok(())
}

async fn run_weights(
    config: &RingsConfig,
    epoch: &ResolvedEpoch,
    tokens: Vec<String>,
) -> anyhow::Result<()> {
    let pools = MergedPoolSource::new()
        .with_variant(
            RegistryA::new(graph(config, &config.subgraph.registry_a_deployment))
                .with_page_size(config.page_size),
        )
        .with_variant(
            RegistryB::new(graph(config, &config.subgraph.registry_b_deployment))
                .with_page_size(config.page_size),
        );
    let gauges = SubgraphGauges::new(
        GraphClient::new(config.api_url.clone()),
        graph(config, &config.subgraph.gauges_deployment),
    )
    .with_chain(config.chain.clone())
    .with_page_size(config.page_size);

    let runner =
        EpochRunner::new(pools, gauges).with_sampler(BlockSampler::new(config.samples_per_epoch)?);
    let reserves = RpcReserveReader::new(config.rpc_url.clone());
    let submitter = config.submission.as_ref().map(Submitter::new);

    let names = if tokens.is_empty() {
        config.token_names()
    } else {
        tokens
    };

    for name in &names {
        let report = run::token_report(config, &runner, &reserves, epoch, name).await?;
        run::persist(config, &report)?;

        if let Some(submitter) = &submitter {
            if let Err(e) = submitter.submit(&config.vault, &report.weights).await {
                tracing::warn!(token = %report.token, error = %e, "weight submission failed");
            }
        }
    }
    Ok(())
}

async fn run_pool_weights(
    config: &RingsConfig,
    epoch: &ResolvedEpoch,
    token: &str,
) -> anyhow::Result<()> {
    let pools = RegistryB::new(graph(config, &config.subgraph.pool_weights_deployment))
        .with_page_size(config.page_size);
    let weights = run::pool_weight_report(config, &pools, epoch, token).await?;

    let (name, _) = config.token(token)?;
    output::write_records(
        &config.output_dir,
        &output::pool_weights_file_name(epoch.window.cycle, name),
        &weights,
    )?;

    println!("poolId,weight");
    for w in &weights {
        println!("{},{}", w.pool_id, FixedDecimal::from_raw(w.weight, PRECISION_DECIMALS));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_weights_with_tokens() {
        let cli = Cli::try_parse_from([
            "rings-daemon",
            "--log-format",
            "json",
            "weights",
            "--cycle",
            "4",
            "--token",
            "scUSD,scETH",
        ])
        .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        match cli.command {
            Command::Weights { cycle, tokens } => {
                assert_eq!(selector(cycle), CycleSelector::Cycle(4));
                assert_eq!(tokens, vec!["scUSD", "scETH"]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn missing_cycle_means_current() {
        assert_eq!(selector(None), CycleSelector::Current);
    }

    #[test]
    fn flags_override_file_settings() {
        let cli = Cli::try_parse_from([
            "rings-daemon",
            "--graph-api-key",
            "k",
            "--submit-url",
            "https://example.invalid/submit",
            "--samples-per-epoch",
            "8",
            "pool-weights",
            "--token",
            "scUSD",
        ])
        .unwrap();
        let mut config = RingsConfig::from_toml_str(
            r#"
            [submission]
            url = "https://old.invalid"
            expected_status = 201
            "#,
        )
        .unwrap();
        cli.apply(&mut config);
        assert_eq!(config.subgraph.api_key, "k");
        assert_eq!(config.samples_per_epoch, 8);
        let submission = config.submission.unwrap();
        assert_eq!(submission.url, "https://example.invalid/submit");
        assert_eq!(submission.expected_status, 201);
    }
}
