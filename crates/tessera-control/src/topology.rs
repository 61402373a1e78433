// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Rank topology: the brick grid and each rank's place in it.
//!
//! Everything here is a pure function of `(rank, world_size)`, so every rank
//! computes the same grid and the same coordinates for all of its peers
//! without communicating.

use crate::error::TopologyError;
use std::fmt;

/// Number of bricks along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Bricks along x.
    pub x: usize,
    /// Bricks along y.
    pub y: usize,
    /// Bricks along z.
    pub z: usize,
}

impl Grid {
    /// Creates a grid.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total number of bricks.
    pub const fn cells(&self) -> usize {
        self.x * self.y * self.z
    }

    /// The dimensions as `[x, y, z]`.
    pub const fn to_array(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// `true` for a multi-brick grid split along a single axis.
    pub fn is_degenerate(&self) -> bool {
        let unit_axes = self.to_array().iter().filter(|&&n| n == 1).count();
        self.cells() > 1 && unit_axes == 2
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// A brick's integer position in the [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrickCoord {
    /// Column along x.
    pub x: usize,
    /// Column along y.
    pub y: usize,
    /// Column along z.
    pub z: usize,
}

impl BrickCoord {
    /// Creates a coordinate.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// The coordinate as `[x, y, z]`.
    pub const fn to_array(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for BrickCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Smallest divisor of `n` in `2..=sqrt(n)`, `None` if `n` is 1 or prime.
pub fn compute_divisor(n: usize) -> Option<usize> {
    (2..).take_while(|d| d * d <= n).find(|d| n % d == 0)
}

/// Factors `world_size` into a brick grid.
///
/// Divisors are extracted smallest first and multiplied onto the axes in
/// x, y, z order, wrapping around. The factor left when no divisor remains
/// goes to the axis that is due next; a prime `world_size` has nothing
/// extracted and lands entirely on z, giving `1x1xN`.
///
/// A `world_size` of 0 is treated as 1.
pub fn compute_grid(world_size: usize) -> Grid {
    let mut dims = [1_usize; 3];
    let mut remaining = world_size.max(1);
    let mut axis = 0;
    let mut extracted = false;

    while let Some(divisor) = compute_divisor(remaining) {
        dims[axis] *= divisor;
        remaining /= divisor;
        axis = (axis + 1) % 3;
        extracted = true;
    }
    if remaining != 1 {
        let due = if extracted { axis } else { 2 };
        dims[due] *= remaining;
    }

    Grid::new(dims[0], dims[1], dims[2])
}

/// Mixed-radix position of `rank` in `grid`, x fastest.
pub fn brick_coord(grid: Grid, rank: usize) -> BrickCoord {
    BrickCoord::new(
        rank % grid.x,
        (rank / grid.x) % grid.y,
        rank / (grid.x * grid.y),
    )
}

/// Inverse of [`brick_coord`], `None` outside the grid.
pub fn brick_rank(grid: Grid, coord: BrickCoord) -> Option<usize> {
    (coord.x < grid.x && coord.y < grid.y && coord.z < grid.z)
        .then(|| coord.x + grid.x * (coord.y + grid.y * coord.z))
}

/// The grid and every rank's brick, seen from one rank.
#[derive(Debug, Clone)]
pub struct RankTopology {
    rank: usize,
    grid: Grid,
    coords: Vec<BrickCoord>,
}

impl RankTopology {
    /// Builds the topology of `rank` in a group of `world_size`.
    pub fn new(rank: usize, world_size: usize) -> Result<Self, TopologyError> {
        if world_size == 0 {
            return Err(TopologyError::EmptyGroup);
        }
        if rank >= world_size {
            return Err(TopologyError::RankOutOfRange { rank, world_size });
        }

        let grid = compute_grid(world_size);
        if grid.is_degenerate() {
            log::info!(
                "Topology: world size {} has no divisor, bricks form a {} grid",
                world_size,
                grid
            );
        }
        let coords = (0..world_size).map(|r| brick_coord(grid, r)).collect();
        Ok(Self { rank, grid, coords })
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks.
    pub fn world_size(&self) -> usize {
        self.coords.len()
    }

    /// The brick grid.
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// This rank's brick.
    pub fn coord(&self) -> BrickCoord {
        self.coords[self.rank]
    }

    /// The brick of `rank`.
    pub fn coord_of(&self, rank: usize) -> Option<BrickCoord> {
        self.coords.get(rank).copied()
    }

    /// The rank owning `coord`.
    pub fn rank_at(&self, coord: BrickCoord) -> Option<usize> {
        brick_rank(self.grid, coord)
    }

    /// Ranks whose bricks share a face with `rank`'s brick, ascending.
    pub fn neighbours(&self, rank: usize) -> Vec<usize> {
        let Some(coord) = self.coord_of(rank) else {
            return Vec::new();
        };
        let mut found = Vec::with_capacity(6);
        let c = coord.to_array();
        for axis in 0..3 {
            for step in [-1_isize, 1] {
                let Some(moved) = c[axis].checked_add_signed(step) else {
                    continue;
                };
                let mut next = c;
                next[axis] = moved;
                if let Some(r) = self.rank_at(BrickCoord::new(next[0], next[1], next[2])) {
                    found.push(r);
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// `true` when the grid is split along a single axis only.
    pub fn is_degenerate(&self) -> bool {
        self.grid.is_degenerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_compute_divisor() {
        assert_eq!(compute_divisor(1), None);
        assert_eq!(compute_divisor(2), None);
        assert_eq!(compute_divisor(9), Some(3));
        assert_eq!(compute_divisor(12), Some(2));
        assert_eq!(compute_divisor(13), None);
    }

    #[test]
    fn test_grid_of_eight_is_a_cube() {
        assert_eq!(compute_grid(8), Grid::new(2, 2, 2));
        assert_eq!(brick_coord(compute_grid(8), 5), BrickCoord::new(1, 0, 1));
    }

    #[test]
    fn test_prime_world_size_is_degenerate_but_valid() {
        let grid = compute_grid(7);
        assert_eq!(grid, Grid::new(1, 1, 7));
        assert_eq!(grid.cells(), 7);
        assert!(grid.is_degenerate());
    }

    #[test]
    fn test_known_grids() {
        assert_eq!(compute_grid(1), Grid::new(1, 1, 1));
        assert_eq!(compute_grid(0), Grid::new(1, 1, 1));
        assert_eq!(compute_grid(2), Grid::new(1, 1, 2));
        assert_eq!(compute_grid(4), Grid::new(2, 2, 1));
        assert_eq!(compute_grid(6), Grid::new(2, 3, 1));
        assert_eq!(compute_grid(12), Grid::new(2, 2, 3));
        assert_eq!(compute_grid(16), Grid::new(4, 2, 2));
    }

    #[test]
    fn test_grid_product_and_unique_coordinates() {
        for n in 1..=64 {
            let grid = compute_grid(n);
            assert_eq!(grid.cells(), n, "grid {grid} for {n}");
            assert_eq!(compute_grid(n), grid);

            let coords: HashSet<BrickCoord> = (0..n).map(|r| brick_coord(grid, r)).collect();
            assert_eq!(coords.len(), n);
            for coord in &coords {
                assert!(coord.x < grid.x && coord.y < grid.y && coord.z < grid.z);
            }
            for r in 0..n {
                assert_eq!(brick_rank(grid, brick_coord(grid, r)), Some(r));
            }
        }
    }

    #[test]
    fn test_topology_rejects_bad_ranks() {
        assert_eq!(RankTopology::new(0, 0).unwrap_err(), TopologyError::EmptyGroup);
        assert_eq!(
            RankTopology::new(4, 4).unwrap_err(),
            TopologyError::RankOutOfRange {
                rank: 4,
                world_size: 4
            }
        );
    }

    #[test]
    fn test_neighbours_in_a_cube() {
        let topology = RankTopology::new(0, 8).unwrap();
        assert_eq!(topology.coord(), BrickCoord::new(0, 0, 0));
        assert_eq!(topology.neighbours(0), vec![1, 2, 4]);
        assert_eq!(topology.neighbours(7), vec![3, 5, 6]);
        assert!(topology.neighbours(8).is_empty());
    }

    #[test]
    fn test_neighbours_along_a_line() {
        let topology = RankTopology::new(3, 7).unwrap();
        assert!(topology.is_degenerate());
        assert_eq!(topology.coord(), BrickCoord::new(0, 0, 3));
        assert_eq!(topology.neighbours(3), vec![2, 4]);
        assert_eq!(topology.neighbours(6), vec![5]);
    }
}
