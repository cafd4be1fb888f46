// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial index for tolerance-based node lookup.
//!
//! Uses a grid-based spatial hash for O(1) average-case nearest-node
//! queries. This is the foundation for snapping, where any input vertex
//! within tolerance of a node is identified with that node.

use rustc_hash::FxHashMap;
use topogeo_geometry::Coord;

use crate::arena::PlanarArena;
use crate::geometry::dist_sq;
use crate::keys::NodeKey;

/// A spatial hash grid for fast tolerance-based node lookup.
///
/// The grid divides the plane into square cells of side `cell_size`.
/// Lookups check the 3x3 neighbourhood of the query cell, which is exact
/// as long as the tolerance does not exceed the cell size. Larger
/// tolerances fall back to a scan of the arena.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<NodeKey>>,
}

impl SpatialIndex {
    /// Creates a new spatial index with the given cell size.
    ///
    /// Non-positive or non-finite sizes are replaced by 1.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Builds a spatial index from all nodes in an arena.
    pub fn from_arena(arena: &PlanarArena, cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);
        for (key, data) in arena.nodes.iter() {
            index.insert(key, &data.coord);
        }
        index
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Inserts a node key at the given coordinate.
    pub fn insert(&mut self, key: NodeKey, coord: &Coord) {
        let cell = self.cell_coords(coord);
        self.grid.entry(cell).or_default().push(key);
    }

    /// Finds the node nearest to `coord` within `tolerance`.
    pub fn find_near(&self, arena: &PlanarArena, coord: &Coord, tolerance: f64) -> Option<NodeKey> {
        if tolerance > self.cell_size {
            return arena.find_node_near(coord, tolerance);
        }

        let (cx, cy) = self.cell_coords(coord);
        let tol_sq = tolerance * tolerance;
        let mut best: Option<(NodeKey, f64)> = None;

        // Search 3x3 neighbourhood; cells past the i64 range collapse onto the edge cell
        for dx in -1..=1 {
            for dy in -1..=1 {
                let cell = (cx.saturating_add(dx), cy.saturating_add(dy));
                if let Some(keys) = self.grid.get(&cell) {
                    for &nk in keys {
                        if let Some(n) = arena.node(nk) {
                            let d = dist_sq(&n.coord, coord);
                            if d <= tol_sq && best.map_or(true, |(_, b)| d < b) {
                                best = Some((nk, d));
                            }
                        }
                    }
                }
            }
        }

        best.map(|(k, _)| k)
    }

    fn cell_coords(&self, coord: &Coord) -> (i64, i64) {
        (
            (coord.x / self.cell_size).floor() as i64,
            (coord.y / self.cell_size).floor() as i64,
        )
    }
}

impl PlanarArena {
    /// Finds the nearest node to a point within tolerance by scanning.
    pub fn find_node_near(&self, coord: &Coord, tolerance: f64) -> Option<NodeKey> {
        let tol_sq = tolerance * tolerance;
        let mut best: Option<(NodeKey, f64)> = None;

        for (key, n) in &self.nodes {
            let d = dist_sq(&n.coord, coord);
            if d <= tol_sq && best.map_or(true, |(_, b)| d < b) {
                best = Some((key, d));
            }
        }

        best.map(|(k, _)| k)
    }
}
