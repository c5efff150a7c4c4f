// src/tilemap/core.rs
//! Core value types for grid placement: poses, footprints, cell boxes and map extents.
//! Keep this file dependency-light; everything else in `tilemap` builds on it.

use bevy::prelude::*; // IVec2, IVec3, Vec3, Quat, Mat4, Transform
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Lowest cell row (inclusive) a tilemap can hold.
pub const MIN_HEIGHT: i32 = -64;
/// Highest cell row (exclusive) a tilemap can hold.
pub const MAX_HEIGHT: i32 = 64;

// ---------- Ids ----------

/// Index of a tile type in the catalog (stable during a session).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileTypeId(pub u32);

// ---------- Pose ----------

const COS: [i32; 4] = [1, 0, -1, 0];
const SIN: [i32; 4] = [0, 1, 0, -1];

/// Discrete placement of a tile: reference cell + quarter turns about +Y.
///
/// `rotation` is always read modulo 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePose {
    pub position: IVec3,
    #[serde(default)]
    pub rotation: u8,
}

impl TilePose {
    pub const fn new(position: IVec3, rotation: u8) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub const fn quarter_turns(&self) -> usize {
        (self.rotation % 4) as usize
    }

    /// Yaw of this pose. Negative angle so that the quaternion turns +X into +Z
    /// for one quarter turn, exactly like [`TilePose::apply_rotation`].
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(-FRAC_PI_2 * self.quarter_turns() as f32)
    }

    /// Local tile space → grid space: cell center in XZ, no vertical offset.
    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position.as_vec3() + Vec3::new(0.5, 0.0, 0.5))
            .with_rotation(self.rotation_quat())
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(
            self.rotation_quat(),
            self.position.as_vec3() + Vec3::new(0.5, 0.0, 0.5),
        )
    }

    /// Rotate a vector by this pose's quarter turns. Y is untouched.
    pub fn apply_rotation(&self, v: Vec3) -> Vec3 {
        let cos = COS[self.quarter_turns()] as f32;
        let sin = SIN[self.quarter_turns()] as f32;
        Vec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
    }

    /// Integer variant, exact for axis-aligned extents.
    pub fn apply_rotation_i(&self, v: IVec3) -> IVec3 {
        let cos = COS[self.quarter_turns()];
        let sin = SIN[self.quarter_turns()];
        IVec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
    }
}

// ---------- Footprint ----------

/// Grid extent of a tile type before rotation, plus its rotation policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileFootprint {
    pub size: IVec3,
    pub can_be_rotated: bool,
}

impl Default for TileFootprint {
    fn default() -> Self {
        Self { size: IVec3::ONE, can_be_rotated: true }
    }
}

impl TileFootprint {
    pub const fn new(size: IVec3, can_be_rotated: bool) -> Self {
        Self { size, can_be_rotated }
    }

    /// Cells occupied when placed at `pose`: every footprint cell offset turned
    /// about the reference cell, i.e. the box anchored at `pose.position`
    /// spanning the rotated size.
    pub fn cells(&self, pose: &TilePose) -> CellBounds {
        CellBounds::from_extent(pose.position, pose.apply_rotation_i(self.size))
    }

    /// False when `rotation` turns a tile that is marked as not rotatable.
    #[inline]
    pub const fn permits_rotation(&self, rotation: u8) -> bool {
        self.can_be_rotated || rotation % 4 == 0
    }

    /// Rotation a tool should actually use: fixed tiles always go in unrotated.
    #[inline]
    pub const fn effective_rotation(&self, rotation: u8) -> u8 {
        if self.can_be_rotated { rotation % 4 } else { 0 }
    }

    /// A footprint with a non-positive axis occupies nothing and is never placeable.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0 || self.size.z <= 0
    }
}

/// A tile type as seen by the builder: catalog id plus the footprint it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileType {
    pub id: TileTypeId,
    pub footprint: TileFootprint,
}

impl TileType {
    pub const fn new(id: TileTypeId, footprint: TileFootprint) -> Self {
        Self { id, footprint }
    }
}

/// Resolves tile type ids to footprints (implemented by the catalog).
pub trait FootprintLookup {
    fn footprint(&self, tile: TileTypeId) -> Option<TileFootprint>;

    fn tile_type(&self, tile: TileTypeId) -> Option<TileType> {
        self.footprint(tile).map(|footprint| TileType::new(tile, footprint))
    }
}

impl FootprintLookup for std::collections::HashMap<TileTypeId, TileFootprint> {
    fn footprint(&self, tile: TileTypeId) -> Option<TileFootprint> {
        self.get(&tile).copied()
    }
}

// ---------- Cell boxes ----------

/// Integer axis-aligned box of cells: `min` inclusive, `min + size` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellBounds {
    pub min: IVec3,
    pub size: IVec3,
}

impl CellBounds {
    pub const fn new(min: IVec3, size: IVec3) -> Self {
        Self { min, size }
    }

    /// Box anchored at `anchor` extending by `extent` cells per axis.
    /// A negative extent `e` covers `anchor + e + 1 ..= anchor`.
    pub fn from_extent(anchor: IVec3, extent: IVec3) -> Self {
        let axis = |a: i32, e: i32| if e >= 0 { (a, e) } else { (a + e + 1, -e) };
        let (x, sx) = axis(anchor.x, extent.x);
        let (y, sy) = axis(anchor.y, extent.y);
        let (z, sz) = axis(anchor.z, extent.z);
        Self { min: IVec3::new(x, y, z), size: IVec3::new(sx, sy, sz) }
    }

    /// Box spanning two corner cells, both inclusive.
    pub fn from_corners(a: IVec3, b: IVec3) -> Self {
        let min = a.min(b);
        Self { min, size: a.max(b) - min + IVec3::ONE }
    }

    /// Exclusive upper corner.
    #[inline]
    pub fn max(&self) -> IVec3 {
        self.min + self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0 || self.size.z <= 0
    }

    pub fn volume(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            // Saturates so huge regions compare as larger than any occupied set.
            (self.size.x as usize)
                .checked_mul(self.size.y as usize)
                .and_then(|v| v.checked_mul(self.size.z as usize))
                .unwrap_or(usize::MAX)
        }
    }

    pub fn contains(&self, cell: IVec3) -> bool {
        let max = self.max();
        cell.x >= self.min.x && cell.x < max.x &&
        cell.y >= self.min.y && cell.y < max.y &&
        cell.z >= self.min.z && cell.z < max.z
    }

    pub fn intersects(&self, other: &CellBounds) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (a, b) = (self.max(), other.max());
        self.min.x < b.x && other.min.x < a.x &&
        self.min.y < b.y && other.min.y < a.y &&
        self.min.z < b.z && other.min.z < a.z
    }

    /// Every cell inside, x outermost then y then z.
    pub fn iter(&self) -> impl Iterator<Item = IVec3> {
        let (min, max) = (self.min, self.max());
        (min.x..max.x).flat_map(move |x| {
            (min.y..max.y).flat_map(move |y| (min.z..max.z).map(move |z| IVec3::new(x, y, z)))
        })
    }
}

// ---------- Map extents ----------

/// Placement rectangle of a tilemap over (x, z). `min` inclusive, `min + size` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapRect {
    pub min: IVec2,
    pub size: IVec2,
}

impl Default for MapRect {
    fn default() -> Self {
        Self { min: IVec2::ZERO, size: IVec2::new(32, 32) }
    }
}

impl MapRect {
    pub const fn new(min: IVec2, size: IVec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> IVec2 {
        self.min + self.size
    }

    pub fn contains(&self, p: IVec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x < max.x && p.y >= self.min.y && p.y < max.y
    }

    /// Rectangle × fixed height range, as a cell box.
    pub fn cell_bounds(&self) -> CellBounds {
        CellBounds::new(
            IVec3::new(self.min.x, MIN_HEIGHT, self.min.y),
            IVec3::new(self.size.x, MAX_HEIGHT - MIN_HEIGHT, self.size.y),
        )
    }
}
