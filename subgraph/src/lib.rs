//! Network-backed collaborators for the weight engine.
//!
//! Subgraphs are queried over GraphQL with `id_gt` cursor pagination;
//! historical vault balances come from a JSON-RPC node. Nothing here
//! retries: a failed request surfaces as [`SubgraphError`] and becomes an
//! `EngineError::Data` at the engine boundary.

pub mod blocks;
pub mod client;
pub mod error;
pub mod gauges;
pub mod registry_a;
pub mod registry_b;
mod rows;
pub mod rpc;

pub use blocks::SubgraphBlocks;
pub use client::{GraphClient, DEFAULT_PAGE_SIZE};
pub use error::SubgraphError;
pub use gauges::SubgraphGauges;
pub use registry_a::RegistryA;
pub use registry_b::RegistryB;
pub use rpc::RpcReserveReader;
