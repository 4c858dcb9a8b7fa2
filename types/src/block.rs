//! Block heights.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain block height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Number of blocks from `earlier` up to `self`, or `None` if `earlier`
    /// is ahead of `self`.
    pub fn blocks_since(&self, earlier: BlockHeight) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    pub fn saturating_add(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}
