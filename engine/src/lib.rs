//! Epoch sampling and proportional-ownership weight engine.
//!
//! For a token and an epoch, the engine samples pool state at a fixed block
//! cadence, attributes each pool's reserve of the token to its holders in
//! proportion to their shares (resolving staking gauges to their depositors),
//! and normalizes the accumulated ownership into weights summing to exactly
//! 10^36.
//!
//! ## Module overview
//!
//! - [`sampler`]: epoch block range to sampled heights.
//! - [`source`]: collaborator traits (blocks, pools, gauges, balances).
//! - [`snapshot`]: normalising and merging registry variants.
//! - [`aggregator`]: per-pool ownership and the epoch accumulator.
//! - [`gauge`]: gauge delegation resolution.
//! - [`conservation`]: reconciliation checks.
//! - [`normalizer`]: fixed-point weights with remainder reconciliation.
//! - [`runner`]: one epoch computation end to end.
//! - [`epoch`]: cycle calendar.
//! - [`pool_weights`]: pool-level weights.
//! - [`points`]: points derived from weights.

pub mod aggregator;
pub mod conservation;
pub mod epoch;
pub mod error;
pub mod gauge;
pub mod normalizer;
pub mod points;
pub mod pool_weights;
pub mod runner;
pub mod sampler;
pub mod snapshot;
pub mod source;

pub use aggregator::{OwnershipAccumulator, PoolContribution};
pub use conservation::ConservationChecker;
pub use epoch::{CycleSelector, EpochSchedule, EpochWindow};
pub use error::EngineError;
pub use gauge::GaugeCorrection;
pub use normalizer::{normalize, weight_records, weight_unit};
pub use runner::{BlockRange, EpochRunner, EpochWeights};
pub use sampler::BlockSampler;
pub use snapshot::{MergedPoolSource, PoolShareRow};
pub use source::{BlockResolver, GaugeSource, NoGauges, PoolSource, ReserveReader};
