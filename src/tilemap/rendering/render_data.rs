// src/tilemap/rendering/render_data.rs
//! CPU side of tile rendering: per tile type world matrices, batched.

use bevy::prelude::*;

use crate::tilemap::catalog::TileCatalog;
use crate::tilemap::core::TileTypeId;
use crate::tilemap::state::Tilemap;

use super::batcher::InstanceBatcher;

/// Everything needed to draw all instances of one tile type.
#[derive(Clone, Debug)]
pub struct TileRenderList {
    pub tile: TileTypeId,
    pub batcher: InstanceBatcher<Mat4>,
}

/// World transforms of every placed instance, grouped by tile type:
/// `tilemap_matrix * pose * tile local transform`.
///
/// Tile types missing from the catalog or without materials are skipped.
pub fn build_render_lists(
    tilemap: &Tilemap,
    catalog: &TileCatalog,
    tilemap_matrix: Mat4,
) -> Vec<TileRenderList> {
    let mut out = Vec::with_capacity(tilemap.tiles.len());

    for instances in &tilemap.tiles {
        if instances.poses.is_empty() {
            continue;
        }
        let Some(def) = catalog.get(instances.tile) else {
            warn!("Tilemap render: tile {:?} is not in the catalog; skipping.", instances.tile);
            continue;
        };
        if !def.is_valid() {
            continue;
        }

        let local = def.transform.to_mat4();
        let matrices: Vec<Mat4> = instances
            .poses
            .iter()
            .map(|pose| tilemap_matrix * pose.to_mat4() * local)
            .collect();

        out.push(TileRenderList {
            tile: instances.tile,
            batcher: InstanceBatcher::new(matrices, true),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::catalog::parse_catalog;
    use crate::tilemap::core::TilePose;
    use crate::tilemap::rendering::batcher::BATCH_CAPACITY;
    use crate::tilemap::state::TileInstances;

    fn catalog() -> TileCatalog {
        parse_catalog(
            br#"[
                (name: "block", mesh: Cuboid((1.0, 1.0, 1.0)), materials: [(base_color: Some((1.0, 1.0, 1.0, 1.0)))],
                 transform: (translation: (0.0, 0.5, 0.0))),
                (name: "ghost", mesh: Cuboid((1.0, 1.0, 1.0))),
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn composes_map_pose_and_local_transforms() {
        let mut map = Tilemap::default();
        map.tiles.push(TileInstances {
            tile: TileTypeId(0),
            poses: vec![TilePose::new(IVec3::new(2, 0, 3), 1)],
        });
        let map_matrix = Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));

        let lists = build_render_lists(&map, &catalog(), map_matrix);
        assert_eq!(lists.len(), 1);
        let m = lists[0].batcher.instances()[0];
        let origin = m.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(102.5, 0.5, 3.5), 1e-5));
    }

    #[test]
    fn skips_tiles_without_materials_or_catalog_entry() {
        let mut map = Tilemap::default();
        map.tiles.push(TileInstances { tile: TileTypeId(1), poses: vec![TilePose::default()] });
        map.tiles.push(TileInstances { tile: TileTypeId(9), poses: vec![TilePose::default()] });
        assert!(build_render_lists(&map, &catalog(), Mat4::IDENTITY).is_empty());
    }

    #[test]
    fn large_groups_are_batched() {
        let poses: Vec<TilePose> =
            (0..1500).map(|i| TilePose::new(IVec3::new(i % 40, 0, i / 40), 0)).collect();
        let mut map = Tilemap::default();
        map.tiles.push(TileInstances { tile: TileTypeId(0), poses });
        let lists = build_render_lists(&map, &catalog(), Mat4::IDENTITY);
        assert_eq!(lists[0].batcher.batch_count(), 2);
        assert_eq!(lists[0].batcher.batches()[0].len(), BATCH_CAPACITY);
    }
}
