pub mod core;
pub mod error;
pub mod spatial_index;
pub mod state;
pub mod builder;
pub mod catalog;
pub mod persist;
pub mod editor;
pub mod plugin;
pub mod rendering;
pub mod stack;

pub use builder::{SubscriptionId, TilemapBuilder};
pub use catalog::{TileCatalog, TileDef};
pub use core::{CellBounds, FootprintLookup, MapRect, TileFootprint, TilePose, TileType, TileTypeId};
pub use error::{Result, TilemapError};
pub use spatial_index::{Node, SpatialIndex};
pub use state::{TileInstances, Tilemap};
pub use stack::TilemapStackPlugin;
