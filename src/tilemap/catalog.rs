// src/tilemap/catalog.rs
//! Data-driven tile types + loader for `*.tiles.ron`.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::core::{FootprintLookup, TileFootprint, TileType, TileTypeId};

// ---------- Public plugin to register asset+loader ----------

pub struct TileCatalogAssetPlugin;

impl Plugin for TileCatalogAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TileCatalog>()
            .register_asset_loader(TileCatalogLoader);
    }
}

// ---------- Render refs (data form) ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TileMesh {
    /// Mesh asset path, e.g. `"models/wall.glb#Mesh0/Primitive0"`.
    Asset(String),
    /// Built-in box of the given full size, centered on the tile origin.
    Cuboid(Vec3),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileMaterialDef {
    /// Material asset path. Takes precedence over `base_color`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub base_color: Option<[f32; 4]>,
    /// Sub-mesh drawn with this material; falls back to the tile's mesh.
    #[serde(default)]
    pub mesh: Option<TileMesh>,
    /// False for materials that must be drawn one instance at a time.
    #[serde(default = "default_true")]
    pub instancing: bool,
}

/// Offset of the mesh inside its tile. Rotation is Euler XYZ in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformValue {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for TransformValue {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl TransformValue {
    pub fn to_transform(&self) -> Transform {
        let r = self.rotation;
        Transform {
            translation: self.translation,
            rotation: Quat::from_euler(
                EulerRot::XYZ,
                r.x.to_radians(),
                r.y.to_radians(),
                r.z.to_radians(),
            ),
            scale: self.scale,
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        self.to_transform().compute_matrix()
    }
}

// ---------- Tile definition (data form) ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDef {
    /// Unique human-readable name (used for lookup and in saved maps).
    pub name: String,

    /// Cells covered before rotation (width, height, depth).
    #[serde(default = "default_size")]
    pub size: IVec3,

    #[serde(default = "default_true")]
    pub can_be_rotated: bool,

    pub mesh: TileMesh,

    #[serde(default)]
    pub materials: Vec<TileMaterialDef>,

    #[serde(default)]
    pub transform: TransformValue,
}

impl TileDef {
    pub fn footprint(&self) -> TileFootprint {
        TileFootprint::new(self.size, self.can_be_rotated)
    }

    /// Drawable: has at least one material.
    pub fn is_valid(&self) -> bool {
        !self.materials.is_empty()
    }
}

fn default_true() -> bool {
    true
}
fn default_size() -> IVec3 {
    IVec3::ONE
}
fn default_scale() -> Vec3 {
    Vec3::ONE
}

// ---------- Runtime catalog asset ----------

#[derive(Asset, TypePath, Clone, Debug)]
pub struct TileCatalog {
    /// Ordered list; index in this vector is the `TileTypeId.0`.
    pub tiles: Vec<TileDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl TileCatalog {
    /// Validates names and sizes and builds the lookup table.
    pub fn from_defs(defs: Vec<TileDef>) -> Result<Self, TileCatalogLoadError> {
        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if def.footprint().is_degenerate() {
                return Err(TileCatalogLoadError::InvalidSize { name: def.name.clone(), size: def.size });
            }
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(TileCatalogLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }
        Ok(Self { tiles: defs, name_to_index })
    }

    pub fn index_of(&self, name: &str) -> Option<TileTypeId> {
        self.name_to_index.get(name).map(|&i| TileTypeId(i))
    }

    pub fn get(&self, id: TileTypeId) -> Option<&TileDef> {
        self.tiles.get(id.0 as usize)
    }

    pub fn name_of(&self, id: TileTypeId) -> Option<&str> {
        self.get(id).map(|d| d.name.as_str())
    }

    /// Ids of the tiles matching `predicate`, in catalog order.
    pub fn filter(&self, predicate: impl Fn(&TileDef) -> bool) -> Vec<TileTypeId> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, d)| predicate(d))
            .map(|(i, _)| TileTypeId(i as u32))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl FootprintLookup for TileCatalog {
    fn footprint(&self, tile: TileTypeId) -> Option<TileFootprint> {
        self.get(tile).map(TileDef::footprint)
    }
}

impl TileCatalog {
    pub fn tile_type_named(&self, name: &str) -> Option<TileType> {
        self.index_of(name).and_then(|id| self.tile_type(id))
    }
}

// ---------- Asset loader for `.tiles.ron` ----------

#[derive(Default)]
pub struct TileCatalogLoader;

impl AssetLoader for TileCatalogLoader {
    type Asset = TileCatalog;
    type Settings = ();
    type Error = TileCatalogLoadError;

    fn extensions(&self) -> &[&str] {
        &["tiles.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        parse_catalog(&bytes)
    }
}

pub fn parse_catalog(bytes: &[u8]) -> Result<TileCatalog, TileCatalogLoadError> {
    let defs: Vec<TileDef> =
        ron::de::from_bytes(bytes).map_err(|e| TileCatalogLoadError::Ron(e.to_string()))?;
    TileCatalog::from_defs(defs)
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum TileCatalogLoadError {
    #[error("I/O while reading tile catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate tile name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("Tile '{name}' has a non-positive size {size}")]
    InvalidSize { name: String, size: IVec3 },
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        (
            name: "floor",
            mesh: Cuboid((1.0, 0.1, 1.0)),
            materials: [(base_color: Some((0.4, 0.4, 0.4, 1.0)))],
        ),
        (
            name: "table",
            size: (2, 1, 1),
            can_be_rotated: false,
            mesh: Asset("models/table.glb#Mesh0/Primitive0"),
            materials: [(path: Some("models/table.glb#Material0"), instancing: false)],
            transform: (translation: (0.5, 0.0, 0.0), rotation: (0.0, 90.0, 0.0)),
        ),
    ]"#;

    #[test]
    fn parses_defaults_and_overrides() {
        let catalog = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);

        let floor = catalog.get(TileTypeId(0)).unwrap();
        assert_eq!(floor.size, IVec3::ONE);
        assert!(floor.can_be_rotated);
        assert!(floor.materials[0].instancing);
        assert_eq!(floor.transform, TransformValue::default());

        let table = catalog.tile_type_named("table").unwrap();
        assert_eq!(table.id, TileTypeId(1));
        assert_eq!(table.footprint, TileFootprint::new(IVec3::new(2, 1, 1), false));
        assert!(!catalog.get(table.id).unwrap().materials[0].instancing);
    }

    #[test]
    fn rejects_duplicate_names() {
        let src = r#"[(name: "a", mesh: Cuboid((1.0, 1.0, 1.0))), (name: "a", mesh: Cuboid((1.0, 1.0, 1.0)))]"#;
        assert!(matches!(
            parse_catalog(src.as_bytes()),
            Err(TileCatalogLoadError::DuplicateName { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty_footprint() {
        let src = r#"[(name: "flat", size: (1, 0, 1), mesh: Cuboid((1.0, 1.0, 1.0)))]"#;
        assert!(matches!(
            parse_catalog(src.as_bytes()),
            Err(TileCatalogLoadError::InvalidSize { .. })
        ));
    }

    #[test]
    fn filter_keeps_catalog_order() {
        let catalog = parse_catalog(CATALOG.as_bytes()).unwrap();
        let rotatable = catalog.filter(|d| d.can_be_rotated);
        assert_eq!(rotatable, vec![TileTypeId(0)]);
        assert_eq!(catalog.name_of(TileTypeId(1)), Some("table"));
    }

    #[test]
    fn local_transform_rotates_about_y() {
        let t = TransformValue { rotation: Vec3::new(0.0, 90.0, 0.0), ..Default::default() };
        let v = t.to_mat4().transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn shipped_cuboids_sit_inside_their_cells() {
        use crate::tilemap::core::TilePose;

        let catalog = parse_catalog(include_bytes!("../../assets/tiles/catalog.tiles.ron")).unwrap();
        for (i, def) in catalog.tiles.iter().enumerate() {
            let TileMesh::Cuboid(size) = &def.mesh else { continue };
            let footprint = catalog.footprint(TileTypeId(i as u32)).unwrap();
            let turns = if footprint.can_be_rotated { 0..4u8 } else { 0..1u8 };
            for r in turns {
                let pose = TilePose::new(IVec3::new(3, 2, 5), r);
                let cells = footprint.cells(&pose);
                // Cell (x, y, z) spans x..x+1, y-0.5..y+0.5, z..z+1 in grid space.
                let lo = cells.min.as_vec3() - Vec3::new(0.0, 0.5, 0.0);
                let hi = cells.max().as_vec3() - Vec3::new(0.0, 0.5, 0.0);

                let center = (pose.to_mat4() * def.transform.to_mat4()).transform_point3(Vec3::ZERO);
                let half = pose.apply_rotation(*size * 0.5).abs();
                let eps = Vec3::splat(1e-4);
                assert!(
                    (center - half).cmpge(lo - eps).all() && (center + half).cmple(hi + eps).all(),
                    "{} at rotation {r} is drawn outside {:?}",
                    def.name,
                    cells
                );
                let mid = (lo + hi) * 0.5;
                assert!((center.x - mid.x).abs() < 1e-4 && (center.z - mid.z).abs() < 1e-4, "{} off-centre", def.name);
            }
        }
    }
}
