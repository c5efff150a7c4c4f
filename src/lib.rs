//! Multi-cell tiles on an integer voxel grid: an occupancy index that rules out
//! overlaps, a builder that keeps the saved instance lists in step with it, and
//! batched rendering of the placed instances with Bevy.

pub mod tilemap;

pub use tilemap::{
    CellBounds, MapRect, Node, SpatialIndex, TileCatalog, TileFootprint, TilePose, TileType,
    TileTypeId, Tilemap, TilemapBuilder, TilemapError, TilemapStackPlugin,
};
