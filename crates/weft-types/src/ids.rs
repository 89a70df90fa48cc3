//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of node indices with
//! element or cluster indices. Descriptors store ids, never pointers;
//! the node-position slice is the single arena they index into.

use serde::{Deserialize, Serialize};

/// Index into the node-position arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Index into the rod constraint array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RodId(pub u32);

/// Index into the triangle element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriId(pub u32);

/// Index into the quad element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadId(pub u32);

/// Index into the fit cluster array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FitClusterId(pub u32);

impl NodeId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RodId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TriId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl QuadId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FitClusterId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for RodId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}
