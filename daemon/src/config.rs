//! Runner configuration with TOML file support.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rings_engine::sampler::{DEFAULT_SAMPLES_PER_EPOCH, MAX_SAMPLES_PER_EPOCH};
use rings_engine::EpochSchedule;
use rings_types::{Address, Timestamp};
use rings_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Configuration for a weight run.
///
/// Loaded from a TOML file via [`RingsConfig::from_toml_file`]; every field
/// has a default so an empty file (or no file) describes the live setup
/// apart from the subgraph API key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RingsConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub subgraph: SubgraphConfig,

    /// GraphQL endpoint serving pool → gauge links.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chain filter for the pools API.
    #[serde(default = "default_chain")]
    pub chain: String,

    /// JSON-RPC endpoint for historical balances.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// The vault holding every pool's tokens; points are derived from its
    /// balance and submissions are keyed by it.
    #[serde(default = "default_vault")]
    pub vault: Address,

    /// Tokens selectable by name.
    #[serde(default = "default_tokens")]
    pub tokens: BTreeMap<String, TokenConfig>,

    #[serde(default)]
    pub epochs: EpochConfig,

    #[serde(default = "default_samples_per_epoch")]
    pub samples_per_epoch: u64,

    /// Rows requested per subgraph page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Directory the JSON results are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where to POST results, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_blocks_deployment")]
    pub blocks_deployment: String,

    /// Registry A (v2 pools).
    #[serde(default = "default_registry_a_deployment")]
    pub registry_a_deployment: String,

    /// Registry B (v3 pools).
    #[serde(default = "default_registry_b_deployment")]
    pub registry_b_deployment: String,

    /// v3 deployment read by the pool-level weights run.
    #[serde(default = "default_pool_weights_deployment")]
    pub pool_weights_deployment: String,

    #[serde(default = "default_gauges_deployment")]
    pub gauges_deployment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: Address,

    /// Decimals of the token's raw on-chain balance.
    #[serde(default = "default_token_decimals")]
    pub decimals: u8,

    /// Whether points are derived for this token.
    #[serde(default)]
    pub points: bool,
}

/// Cycle calendar, in Unix seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochConfig {
    #[serde(default = "default_cycle_zero_start")]
    pub cycle_zero_start: u64,
    #[serde(default = "default_cycle_zero_end")]
    pub cycle_zero_end: u64,
    #[serde(default = "default_cycle_one_start")]
    pub cycle_one_start: u64,
    #[serde(default = "default_cycle_length_secs")]
    pub cycle_length_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub url: String,

    /// The status code that counts as accepted.
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    "https://backend-v3.beets-ftm-node.com/graphql".to_string()
}

fn default_chain() -> String {
    rings_subgraph::gauges::DEFAULT_CHAIN.to_string()
}

fn default_rpc_url() -> String {
    "https://rpc.soniclabs.com".to_string()
}

fn default_vault() -> Address {
    Address::parse("0xba12222222228d8ba445958a75a0704d566bf2c8").unwrap_or_else(|_| Address::zero())
}

fn default_tokens() -> BTreeMap<String, TokenConfig> {
    let token = |address: &str, decimals, points| {
        Address::parse(address).ok().map(|address| TokenConfig {
            address,
            decimals,
            points,
        })
    };
    [
        ("scUSD", token("0xd3dce716f3ef535c5ff8d041c1a41c3bd89b97ae", 6, true)),
        ("scETH", token("0x3bce5cb273f0f148010bbea2470e7b5df84c7812", 18, false)),
    ]
    .into_iter()
    .filter_map(|(name, token)| token.map(|t| (name.to_string(), t)))
    .collect()
}

fn default_samples_per_epoch() -> u64 {
    DEFAULT_SAMPLES_PER_EPOCH
}

fn default_page_size() -> usize {
    rings_subgraph::DEFAULT_PAGE_SIZE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_gateway_url() -> String {
    "https://gateway-arbitrum.network.thegraph.com/api".to_string()
}

fn default_blocks_deployment() -> String {
    "QmZYZcSMaGY2rrq8YFP9avicWf2GM8R2vpB2Xuap1WhipT".to_string()
}

fn default_registry_a_deployment() -> String {
    "Qmbt2NyWBL8WKV5EuBDbByUEUETfhUBVpsLpptFbnwEyrK".to_string()
}

fn default_registry_b_deployment() -> String {
    "QmR1ZDqDUyXih88ytCdaK3hV4ynrJJWst8UjeTg82PGwAf".to_string()
}

fn default_pool_weights_deployment() -> String {
    "QmUgRWkb5JUocGkVidpKtZFMHjexJzkBiSbjufURsXwn9X".to_string()
}

fn default_gauges_deployment() -> String {
    "QmSRNzwTmLu55ZxxyxYULS5T1Kar7upz1jzL5FsMzLpB2e".to_string()
}

fn default_token_decimals() -> u8 {
    18
}

fn default_cycle_zero_start() -> u64 {
    EpochSchedule::default().cycle_zero_start.as_secs()
}

fn default_cycle_zero_end() -> u64 {
    EpochSchedule::default().cycle_zero_end.as_secs()
}

fn default_cycle_one_start() -> u64 {
    EpochSchedule::default().cycle_one_start.as_secs()
}

fn default_cycle_length_secs() -> u64 {
    EpochSchedule::default().cycle_length_secs
}

fn default_expected_status() -> u16 {
    200
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RingsConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        let config: Self = toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if !(1..=MAX_SAMPLES_PER_EPOCH).contains(&self.samples_per_epoch) {
            return Err(DaemonError::Config(format!(
                "samples_per_epoch must be between 1 and {MAX_SAMPLES_PER_EPOCH}"
            )));
        }
        if self.page_size == 0 {
            return Err(DaemonError::Config("page_size must be at least 1".into()));
        }
        if self.epochs.cycle_length_secs == 0 {
            return Err(DaemonError::Config("epochs.cycle_length_secs must be positive".into()));
        }
        if self.epochs.cycle_zero_end < self.epochs.cycle_zero_start {
            return Err(DaemonError::Config("cycle zero ends before it starts".into()));
        }
        Ok(())
    }

    /// Look a token up by name, ignoring case.
    pub fn token(&self, name: &str) -> Result<(&str, &TokenConfig), DaemonError> {
        self.tokens
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(known, token)| (known.as_str(), token))
            .ok_or_else(|| {
                let known: Vec<_> = self.tokens.keys().map(String::as_str).collect();
                DaemonError::Config(format!(
                    "unknown token {name:?} (configured: {})",
                    known.join(", ")
                ))
            })
    }

    /// Every configured token name, in table order.
    pub fn token_names(&self) -> Vec<String> {
        self.tokens.keys().cloned().collect()
    }
}

impl SubgraphConfig {
    /// Query URL for one deployment through the gateway.
    pub fn endpoint(&self, deployment: &str) -> String {
        format!(
            "{}/{}/deployments/id/{}",
            self.gateway_url.trim_end_matches('/'),
            self.api_key,
            deployment
        )
    }
}

impl EpochConfig {
    pub fn schedule(&self) -> EpochSchedule {
        EpochSchedule {
            cycle_zero_start: Timestamp::new(self.cycle_zero_start),
            cycle_zero_end: Timestamp::new(self.cycle_zero_end),
            cycle_one_start: Timestamp::new(self.cycle_one_start),
            cycle_length_secs: self.cycle_length_secs,
        }
    }
}

impl Default for RingsConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            subgraph: SubgraphConfig::default(),
            api_url: default_api_url(),
            chain: default_chain(),
            rpc_url: default_rpc_url(),
            vault: default_vault(),
            tokens: default_tokens(),
            epochs: EpochConfig::default(),
            samples_per_epoch: default_samples_per_epoch(),
            page_size: default_page_size(),
            output_dir: default_output_dir(),
            submission: None,
        }
    }
}

impl Default for SubgraphConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            api_key: String::new(),
            blocks_deployment: default_blocks_deployment(),
            registry_a_deployment: default_registry_a_deployment(),
            registry_b_deployment: default_registry_b_deployment(),
            pool_weights_deployment: default_pool_weights_deployment(),
            gauges_deployment: default_gauges_deployment(),
        }
    }
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            cycle_zero_start: default_cycle_zero_start(),
            cycle_zero_end: default_cycle_zero_end(),
            cycle_one_start: default_cycle_one_start(),
            cycle_length_secs: default_cycle_length_secs(),
        }
    }
}
