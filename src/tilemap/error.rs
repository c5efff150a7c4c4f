// src/tilemap/error.rs

use super::core::{TilePose, TileTypeId};

/// Failures that invalidate a tilemap as a whole. Ordinary rejected edits
/// (overlap, out of bounds, empty removal) are plain `bool` results instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TilemapError {
    #[error("tile type {0:?} is not in the catalog")]
    UnknownTile(TileTypeId),
    #[error("tile '{0}' is not in the catalog")]
    UnknownTileName(String),
    #[error("persisted placement of {tile:?} at {pose:?} overlaps another tile or has an empty footprint")]
    CorruptPlacement { tile: TileTypeId, pose: TilePose },
}

pub type Result<T> = std::result::Result<T, TilemapError>;
