//! Shared utilities for the Rings pool-weight engine.

pub mod logging;
pub mod time;

pub use logging::{init_tracing, LogFormat};
pub use time::{format_elapsed, format_utc};
