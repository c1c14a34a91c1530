//! Fixed board topology: positions, adjacency and mill lines.
//!
//! The registry is built once from the tables in [`crate::constants`] and shared
//! read-only by every board. Besides the raw tables it keeps a per-position index
//! of the mill lines that pass through it, so mill checks only look at the two
//! lines that can have been completed by the last move.

use std::sync::OnceLock;

use crate::constants::{ADJACENCY, MILLS, MILLS_PER_POSITION, NUM_MILLS, NUM_POSITIONS};
use crate::error::InvariantError;

/// A board position, `0..24`.
pub type Point = usize;

/// A mill line: three positions in a row.
pub type Mill = [Point; 3];

/// Read-only topology lookups.
#[derive(Debug)]
pub struct Registry {
    adjacency: [&'static [Point]; NUM_POSITIONS],
    mills: [Mill; NUM_MILLS],
    /// Indices into `mills`, per position.
    mills_by_position: [[usize; MILLS_PER_POSITION]; NUM_POSITIONS],
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The shared topology of the standard board.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::build)
}

/// Fail with [`InvariantError::InvalidPosition`] unless `pos` is on the board.
#[inline]
pub fn validate(pos: Point) -> Result<Point, InvariantError> {
    if pos < NUM_POSITIONS {
        Ok(pos)
    } else {
        Err(InvariantError::InvalidPosition(pos))
    }
}

impl Registry {
    fn build() -> Self {
        let mut mills_by_position = [[0; MILLS_PER_POSITION]; NUM_POSITIONS];
        let mut seen = [0usize; NUM_POSITIONS];
        for (i, mill) in MILLS.iter().enumerate() {
            for &p in mill {
                // The classic board puts every position on exactly two lines.
                debug_assert!(seen[p] < MILLS_PER_POSITION);
                mills_by_position[p][seen[p]] = i;
                seen[p] += 1;
            }
        }
        Self {
            adjacency: ADJACENCY,
            mills: MILLS,
            mills_by_position,
        }
    }

    /// Neighbors of `pos`.
    pub fn neighbors(&self, pos: Point) -> Result<&'static [Point], InvariantError> {
        Ok(self.adjacency[validate(pos)?])
    }

    /// True if `a` and `b` are joined by a line segment.
    pub fn is_adjacent(&self, a: Point, b: Point) -> Result<bool, InvariantError> {
        validate(b)?;
        Ok(self.neighbors(a)?.contains(&b))
    }

    /// The mill lines passing through `pos`.
    pub fn mills_containing(
        &self,
        pos: Point,
    ) -> Result<[Mill; MILLS_PER_POSITION], InvariantError> {
        let idx = self.mills_by_position[validate(pos)?];
        Ok(idx.map(|i| self.mills[i]))
    }

    /// All sixteen mill lines.
    pub fn all_mills(&self) -> &[Mill; NUM_MILLS] {
        &self.mills
    }

    /// Iterate over every position on the board.
    pub fn positions(&self) -> impl Iterator<Item = Point> {
        0..NUM_POSITIONS
    }
}
