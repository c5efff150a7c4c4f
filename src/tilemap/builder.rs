// src/tilemap/builder.rs
//! The only way to edit a tilemap. Owns the grouped instance list and the spatial
//! index together and keeps them describing the same set of placed tiles.

use bevy::prelude::*;

use super::core::{CellBounds, FootprintLookup, TilePose, TileType};
use super::error::{Result, TilemapError};
use super::spatial_index::{Node, SpatialIndex};
use super::state::{TileInstances, Tilemap};

/// Handle returned by [`TilemapBuilder::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut() + Send + Sync>;

pub struct TilemapBuilder {
    tilemap: Tilemap,
    index: SpatialIndex,
    revision: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl TilemapBuilder {
    /// Opens `tilemap` for editing, rebuilding the spatial index from its poses.
    ///
    /// A persisted pair that cannot be re-inserted means the stored map is corrupt;
    /// construction fails rather than silently dropping tiles.
    pub fn new(tilemap: Tilemap, lookup: &impl FootprintLookup) -> Result<Self> {
        let mut index = SpatialIndex::new();
        for (tile, pose) in tilemap.placements() {
            let footprint = lookup.footprint(tile).ok_or(TilemapError::UnknownTile(tile))?;
            if !index.insert(tile, pose, footprint) {
                return Err(TilemapError::CorruptPlacement { tile, pose });
            }
        }

        debug!(
            "Tilemap builder: indexed {} tiles over {} cells",
            tilemap.instance_count(),
            index.len()
        );

        Ok(Self {
            tilemap,
            index,
            revision: 0,
            observers: Vec::new(),
            next_subscription: 0,
        })
    }

    // ---------- Read access ----------

    pub fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Ends the session; the index is dropped, the grouped list survives.
    pub fn into_tilemap(self) -> Tilemap {
        self.tilemap
    }

    pub fn tile_at(&self, cell: IVec3) -> Option<Node> {
        self.index.tile_at(cell).map(|n| **n)
    }

    pub fn instance_count(&self) -> usize {
        self.tilemap.instance_count()
    }

    /// Advances by one for every successful mutating call.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ---------- Change notification ----------

    pub fn subscribe(&mut self, observer: impl FnMut() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        self.revision += 1;
        for (_, observer) in self.observers.iter_mut() {
            observer();
        }
    }

    // ---------- Edits ----------

    pub fn can_place_tile(&self, tile: &TileType, pose: TilePose) -> bool {
        self.tilemap.is_in_bounds(&pose) && self.index.can_place(&tile.footprint, &pose)
    }

    pub fn add_tile(&mut self, tile: &TileType, pose: TilePose) -> bool {
        if !self.place(tile, pose) {
            return false;
        }
        if !tile.footprint.permits_rotation(pose.rotation) {
            warn!(
                "Tile {:?} was placed at {} with rotation {} although it is marked as not rotatable",
                tile.id, pose.position, pose.rotation
            );
        }
        self.notify();
        true
    }

    /// Removes the tile covering `cell`. False if the cell is empty.
    pub fn remove_tile(&mut self, cell: IVec3) -> bool {
        let Some(node) = self.index.remove_at(cell) else {
            return false;
        };
        self.forget(&node);
        self.notify();
        true
    }

    /// Removes every tile touching `bounds`, each in full. False if nothing was there.
    pub fn remove_region(&mut self, bounds: &CellBounds) -> bool {
        let nodes = self.index.query_region(bounds);
        if nodes.is_empty() {
            return false;
        }

        for node in &nodes {
            self.index.remove_node(node);
            self.forget(node);
        }

        debug!("Tilemap builder: removed {} tiles in {:?}", nodes.len(), bounds);
        self.notify();
        true
    }

    /// Paints `bounds` with `tile`, one tile per rotated footprint step, skipping
    /// steps that are occupied or out of the map. Returns how many were placed.
    pub fn fill_region(&mut self, tile: &TileType, rotation: u8, bounds: &CellBounds) -> usize {
        if tile.footprint.is_degenerate() || bounds.is_empty() {
            return 0;
        }

        let turned = TilePose::new(IVec3::ZERO, rotation);
        let extent = turned.apply_rotation_i(tile.footprint.size);
        let step = extent.abs();
        // Anchor inside a step-sized box so the occupied cells start at the box min.
        let anchor = IVec3::new(
            if extent.x < 0 { step.x - 1 } else { 0 },
            if extent.y < 0 { step.y - 1 } else { 0 },
            if extent.z < 0 { step.z - 1 } else { 0 },
        );

        let max = bounds.max();
        let mut placed = 0;
        for x in (bounds.min.x..max.x - step.x + 1).step_by(step.x as usize) {
            for y in (bounds.min.y..max.y - step.y + 1).step_by(step.y as usize) {
                for z in (bounds.min.z..max.z - step.z + 1).step_by(step.z as usize) {
                    let pose = TilePose::new(IVec3::new(x, y, z) + anchor, rotation);
                    if self.place(tile, pose) {
                        placed += 1;
                    }
                }
            }
        }

        if placed > 0 && !tile.footprint.permits_rotation(rotation) {
            warn!(
                "Filled {} x {:?} with rotation {} although it is marked as not rotatable",
                placed, tile.id, rotation
            );
        }
        if placed > 0 {
            debug!("Tilemap builder: filled {} x {:?} in {:?}", placed, tile.id, bounds);
            self.notify();
        }
        placed
    }

    /// Removes every tile. False if the map was already empty.
    pub fn clear(&mut self) -> bool {
        if self.tilemap.tiles.is_empty() {
            return false;
        }
        self.index.clear();
        self.tilemap.clear();
        self.notify();
        true
    }

    // ---------- Internals ----------

    fn place(&mut self, tile: &TileType, pose: TilePose) -> bool {
        if !self.tilemap.is_in_bounds(&pose) || !self.index.insert(tile.id, pose, tile.footprint) {
            return false;
        }

        match self.tilemap.tiles.iter_mut().find(|i| i.tile == tile.id) {
            Some(instances) => instances.poses.push(pose),
            None => self.tilemap.tiles.push(TileInstances { tile: tile.id, poses: vec![pose] }),
        }
        true
    }

    /// Drops the grouped-list entry of a node already taken out of the index.
    fn forget(&mut self, node: &Node) {
        let Some(idx) = self.tilemap.tiles.iter().position(|i| i.tile == node.tile) else {
            warn!("Tilemap builder: removed {:?} had no instance list", node.tile);
            return;
        };

        let instances = &mut self.tilemap.tiles[idx];
        instances.poses.retain(|p| p.position != node.pose.position);
        if instances.poses.is_empty() {
            self.tilemap.tiles.remove(idx);
        }
    }
}
