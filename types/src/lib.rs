//! Fundamental types for the Rings pool-weight engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, pool ids, block heights, timestamps, the fixed-point decimal,
//! pool/gauge snapshots and the terminal weight records.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod time;

pub use address::{Address, PoolId};
pub use amount::{FixedDecimal, PRECISION_DECIMALS, WAD_DECIMALS};
pub use block::BlockHeight;
pub use error::TypesError;
pub use record::{PointsRecord, PoolWeightRecord, WeightRecord};
pub use snapshot::{GaugeSnapshot, HolderShare, PoolSnapshot, TokenReserve};
pub use time::Timestamp;

/// Re-exported so downstream crates agree on one 256-bit integer type.
pub use ethnum::U256;
