// src/tilemap/spatial_index.rs
//! Sparse cell → tile occupancy map. Sole authority on "is this cell taken, and by what".
//!
//! A placed tile is one shared [`Node`]; every cell it covers maps to the same `Arc`,
//! so region queries can dedupe by identity and removal always takes the whole tile.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::core::{CellBounds, TileFootprint, TilePose, TileTypeId};

const DEFAULT_CAPACITY: usize = 1024;

/// One placed tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub tile: TileTypeId,
    pub footprint: TileFootprint,
    pub pose: TilePose,
}

impl Node {
    #[inline]
    pub fn cells(&self) -> CellBounds {
        self.footprint.cells(&self.pose)
    }
}

#[derive(Clone, Debug)]
pub struct SpatialIndex {
    nodes: HashMap<IVec3, Arc<Node>>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { nodes: HashMap::with_capacity(DEFAULT_CAPACITY) }
    }

    #[inline]
    pub fn occupied_cells(footprint: &TileFootprint, pose: &TilePose) -> CellBounds {
        footprint.cells(pose)
    }

    pub fn has_tile_at(&self, cell: IVec3) -> bool {
        self.nodes.contains_key(&cell)
    }

    pub fn tile_at(&self, cell: IVec3) -> Option<&Arc<Node>> {
        self.nodes.get(&cell)
    }

    /// True iff the footprint covers at least one cell and none of them is taken.
    pub fn can_place(&self, footprint: &TileFootprint, pose: &TilePose) -> bool {
        let cells = Self::occupied_cells(footprint, pose);
        !cells.is_empty() && !self.any_within(&cells)
    }

    /// All-or-nothing insert. Returns false without touching the index on overlap.
    pub fn insert(&mut self, tile: TileTypeId, pose: TilePose, footprint: TileFootprint) -> bool {
        if !self.can_place(&footprint, &pose) {
            return false;
        }

        let node = Arc::new(Node { tile, footprint, pose });
        for cell in node.cells().iter() {
            self.nodes.insert(cell, Arc::clone(&node));
        }
        true
    }

    /// Removes the whole tile covering `cell`, if any.
    pub fn remove_at(&mut self, cell: IVec3) -> Option<Arc<Node>> {
        let node = self.nodes.get(&cell).cloned()?;
        self.remove_node(&node);
        Some(node)
    }

    /// Removes every cell `node` covers. Cells owned by a different node are left alone.
    pub fn remove_node(&mut self, node: &Node) {
        for cell in node.cells().iter() {
            if self.nodes.get(&cell).is_some_and(|n| **n == *node) {
                self.nodes.remove(&cell);
            }
        }
    }

    /// Distinct tiles with at least one cell inside `bounds`.
    pub fn query_region(&self, bounds: &CellBounds) -> Vec<Arc<Node>> {
        let mut seen: HashSet<*const Node> = HashSet::new();
        let mut out = Vec::new();

        // Walk whichever side is smaller: the region or the occupied set.
        if bounds.volume() <= self.nodes.len() {
            for cell in bounds.iter() {
                if let Some(node) = self.nodes.get(&cell) {
                    if seen.insert(Arc::as_ptr(node)) {
                        out.push(Arc::clone(node));
                    }
                }
            }
        } else {
            for (cell, node) in &self.nodes {
                if bounds.contains(*cell) && seen.insert(Arc::as_ptr(node)) {
                    out.push(Arc::clone(node));
                }
            }
        }
        out
    }

    /// Distinct tiles in the index.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        let mut seen: HashSet<*const Node> = HashSet::new();
        self.nodes
            .values()
            .filter(|n| seen.insert(Arc::as_ptr(n)))
            .cloned()
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    fn any_within(&self, cells: &CellBounds) -> bool {
        cells.iter().any(|cell| self.nodes.contains_key(&cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: TileFootprint = TileFootprint::new(IVec3::ONE, true);
    const WIDE: TileFootprint = TileFootprint::new(IVec3::new(2, 1, 2), true);

    fn pose(x: i32, y: i32, z: i32, r: u8) -> TilePose {
        TilePose::new(IVec3::new(x, y, z), r)
    }

    fn sorted(b: CellBounds) -> Vec<(i32, i32, i32)> {
        let mut v: Vec<_> = b.iter().map(|c| (c.x, c.y, c.z)).collect();
        v.sort();
        v
    }

    #[test]
    fn wide_tile_occupies_rotated_cells() {
        let cells = SpatialIndex::occupied_cells(&WIDE, &pose(0, 0, 0, 0));
        assert_eq!(sorted(cells), vec![(0, 0, 0), (0, 0, 1), (1, 0, 0), (1, 0, 1)]);

        let cells = SpatialIndex::occupied_cells(&WIDE, &pose(0, 0, 0, 1));
        assert_eq!(sorted(cells), vec![(-1, 0, 0), (-1, 0, 1), (0, 0, 0), (0, 0, 1)]);
    }

    #[test]
    fn can_place_checks_rotated_set() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(0), pose(-1, 0, 1, 0), ONE));

        // Unrotated the wide tile would avoid (-1,0,1); rotated it covers it.
        assert!(index.can_place(&WIDE, &pose(0, 0, 0, 0)));
        assert!(!index.can_place(&WIDE, &pose(0, 0, 0, 1)));
    }

    #[test]
    fn insert_is_all_or_nothing() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(0), pose(1, 0, 1, 0), ONE));
        assert!(!index.insert(TileTypeId(1), pose(0, 0, 0, 0), WIDE));
        assert_eq!(index.len(), 1);
        assert!(!index.has_tile_at(IVec3::ZERO));
    }

    #[test]
    fn cells_share_one_node() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(3), pose(0, 0, 0, 0), WIDE));
        let a = index.tile_at(IVec3::new(0, 0, 0)).cloned().unwrap();
        let b = index.tile_at(IVec3::new(1, 0, 1)).cloned().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn remove_at_takes_whole_tile() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(3), pose(0, 0, 0, 0), WIDE));
        let removed = index.remove_at(IVec3::new(1, 0, 1)).unwrap();
        assert_eq!(removed.pose, pose(0, 0, 0, 0));
        assert!(index.is_empty());
        assert!(index.remove_at(IVec3::new(1, 0, 1)).is_none());
    }

    #[test]
    fn remove_node_keeps_other_tiles() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(0), pose(0, 0, 0, 0), WIDE));
        assert!(index.insert(TileTypeId(1), pose(2, 0, 0, 0), ONE));
        let node = index.tile_at(IVec3::ZERO).cloned().unwrap();
        index.remove_node(&node);
        assert_eq!(index.len(), 1);
        assert!(index.has_tile_at(IVec3::new(2, 0, 0)));
    }

    #[test]
    fn zero_area_footprint_is_never_placeable() {
        let mut index = SpatialIndex::new();
        let flat = TileFootprint::new(IVec3::new(1, 0, 1), true);
        assert!(!index.can_place(&flat, &pose(0, 0, 0, 0)));
        assert!(!index.insert(TileTypeId(0), pose(0, 0, 0, 0), flat));
        assert!(index.is_empty());
    }

    #[test]
    fn query_region_dedupes_multi_cell_tiles() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(0), pose(0, 0, 0, 0), WIDE));
        assert!(index.insert(TileTypeId(1), pose(3, 0, 0, 0), ONE));

        let region = CellBounds::from_corners(IVec3::new(0, 0, 0), IVec3::new(1, 0, 1));
        let found = index.query_region(&region);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tile, TileTypeId(0));

        // Large region walks the occupied set instead.
        let huge = CellBounds::from_corners(IVec3::splat(-100), IVec3::splat(100));
        assert_eq!(index.query_region(&huge).len(), 2);
    }

    #[test]
    fn query_region_over_huge_box_walks_occupied_cells() {
        let mut index = SpatialIndex::new();
        assert!(index.insert(TileTypeId(0), pose(0, 0, 0, 0), WIDE));
        assert!(index.insert(TileTypeId(0), pose(10, -5, 10, 2), WIDE));
        let everything = CellBounds::new(IVec3::splat(-(1 << 22)), IVec3::splat(1 << 23));
        assert_eq!(index.query_region(&everything).len(), 2);
    }
}
