//! Nullable collaborators for deterministic testing.
//!
//! Every external dependency of the engine (block resolution, pool and gauge
//! snapshots, historical balances) is abstracted behind a trait in
//! `rings_engine::source`. This crate provides implementations that:
//! - Return values configured up front
//! - Record which blocks were asked for
//! - Never touch the network
//!
//! Usage: swap subgraph-backed sources for nullables in tests.

pub mod blocks;
pub mod gauges;
pub mod pools;
pub mod reserves;

pub use blocks::NullBlocks;
pub use gauges::NullGauges;
pub use pools::NullPools;
pub use reserves::NullReserves;
