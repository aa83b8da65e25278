//! World position keys for containers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block coordinates identifying one container in the world.
///
/// Ordering is derived so owner maps iterate deterministically
/// (x, then y, then z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// World X coordinate.
    pub x: i32,
    /// World Y coordinate.
    pub y: i32,
    /// World Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a position from block coordinates.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Deterministic backing file name for this position.
    pub fn file_name(&self) -> String {
        format!("x{}y{}z{}.dat", self.x, self.y, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
