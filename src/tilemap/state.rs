// src/tilemap/state.rs
//! The durable tilemap: placement rectangle + instance poses grouped by tile type.
//! The spatial index is never stored; it is rebuilt from this list each session.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::core::{CellBounds, MapRect, TilePose, TileTypeId, MAX_HEIGHT, MIN_HEIGHT};

/// All placed poses of one tile type. Never empty inside a [`Tilemap`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInstances {
    pub tile: TileTypeId,
    pub poses: Vec<TilePose>,
}

#[derive(Component, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tilemap {
    pub rect: MapRect,
    pub tiles: Vec<TileInstances>,
}

impl Tilemap {
    pub fn new(rect: MapRect) -> Self {
        Self { rect, tiles: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Reference cell inside the rectangle and the fixed height range.
    pub fn is_in_bounds(&self, pose: &TilePose) -> bool {
        let p = pose.position;
        self.rect.contains(IVec2::new(p.x, p.z)) && p.y >= MIN_HEIGHT && p.y < MAX_HEIGHT
    }

    pub fn cell_bounds(&self) -> CellBounds {
        self.rect.cell_bounds()
    }

    pub fn instances_of(&self, tile: TileTypeId) -> Option<&TileInstances> {
        self.tiles.iter().find(|i| i.tile == tile)
    }

    pub fn instance_count(&self) -> usize {
        self.tiles.iter().map(|i| i.poses.len()).sum()
    }

    /// Flat `(tile, pose)` view of the grouped list.
    pub fn placements(&self) -> impl Iterator<Item = (TileTypeId, TilePose)> + '_ {
        self.tiles
            .iter()
            .flat_map(|i| i.poses.iter().map(move |p| (i.tile, *p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check_uses_rect_and_height_range() {
        let map = Tilemap::new(MapRect::new(IVec2::ZERO, IVec2::new(4, 4)));
        assert!(map.is_in_bounds(&TilePose::new(IVec3::new(3, 10, 0), 0)));
        assert!(!map.is_in_bounds(&TilePose::new(IVec3::new(4, 0, 0), 0)));
        assert!(!map.is_in_bounds(&TilePose::new(IVec3::new(0, 0, -1), 0)));
        assert!(!map.is_in_bounds(&TilePose::new(IVec3::new(0, MAX_HEIGHT, 0), 0)));
        assert!(map.is_in_bounds(&TilePose::new(IVec3::new(0, MIN_HEIGHT, 0), 0)));
    }

    #[test]
    fn placements_flatten_groups() {
        let mut map = Tilemap::default();
        map.tiles.push(TileInstances {
            tile: TileTypeId(1),
            poses: vec![TilePose::default(), TilePose::new(IVec3::X, 1)],
        });
        map.tiles.push(TileInstances { tile: TileTypeId(2), poses: vec![TilePose::new(IVec3::Z, 0)] });
        assert_eq!(map.instance_count(), 3);
        let flat: Vec<_> = map.placements().collect();
        assert_eq!(flat[2], (TileTypeId(2), TilePose::new(IVec3::Z, 0)));
        assert!(map.instances_of(TileTypeId(3)).is_none());
    }
}
