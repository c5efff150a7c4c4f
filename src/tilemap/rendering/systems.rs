// src/tilemap/rendering/systems.rs

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::render::render_asset::RenderAssetUsages;

use crate::tilemap::catalog::{TileCatalog, TileMaterialDef, TileMesh};
use crate::tilemap::editor::TilesChanged;
use crate::tilemap::plugin::TileCatalogHandle;
use crate::tilemap::state::Tilemap;

use super::components::{BatchStats, TileBatch, TilemapRenderState};
use super::render_data::build_render_lists;
use super::resources::{TileRenderAssets, TilemapRenderConfig};

/// Edits → dirty flag on the edited tilemap.
pub fn mark_dirty_on_tiles_changed(
    mut events: EventReader<TilesChanged>,
    mut q: Query<&mut TilemapRenderState>,
) {
    for TilesChanged(entity) in events.read() {
        if let Ok(mut state) = q.get_mut(*entity) {
            state.mark_dirty();
        }
    }
}

/// Moving the tilemap moves every instance; merged batches are in world space.
pub fn mark_dirty_on_transform_changed(
    mut q: Query<&mut TilemapRenderState, Changed<GlobalTransform>>,
) {
    for mut state in q.iter_mut() {
        state.mark_dirty();
    }
}

/// Rebuild draw entities of dirty tilemaps, within a per-frame budget.
pub fn rebuild_dirty_tilemaps(
    mut commands: Commands,
    mut q: Query<(Entity, &Tilemap, &GlobalTransform, &mut TilemapRenderState)>,
    catalogs: Res<Assets<TileCatalog>>,
    handle: Res<TileCatalogHandle>,
    cfg: Res<TilemapRenderConfig>,
    asset_server: Res<AssetServer>,
    mut cache: ResMut<TileRenderAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(catalog) = catalogs.get(&handle.0) else { return };
    let catalog_id = handle.0.id();
    let mut rebuilt = 0usize;

    for (map_entity, tilemap, global, mut state) in q.iter_mut() {
        if !state.dirty { continue; }
        if rebuilt >= cfg.max_rebuilds_per_frame { break; }

        let lists = build_render_lists(tilemap, catalog, global.compute_matrix());

        // Resolve handles for every slot first; wait if a merged source mesh is still loading.
        let mut slots = Vec::with_capacity(lists.len());
        let mut ready = true;
        for list in &lists {
            let Some(def) = catalog.get(list.tile) else { continue };
            for (i, mat_def) in def.materials.iter().enumerate() {
                let key = (catalog_id, list.tile, i);
                let (mesh_h, mat_h) = cache
                    .by_key
                    .entry(key)
                    .or_insert_with(|| {
                        let mesh = mat_def.mesh.as_ref().unwrap_or(&def.mesh);
                        (
                            resolve_mesh(mesh, &asset_server, &mut meshes),
                            resolve_material(mat_def, &asset_server, &mut materials),
                        )
                    })
                    .clone();
                if mat_def.instancing && meshes.get(&mesh_h).is_none() {
                    ready = false;
                }
                slots.push((list, i, mat_def.instancing, mesh_h, mat_h));
            }
        }
        if !ready { continue; }

        for e in state.entities.drain(..) {
            commands.entity(e).despawn();
        }

        let mut spawned = Vec::new();
        for (list, material_index, instancing, mesh_h, mat_h) in slots {
            if instancing {
                let Some(src_mesh) = meshes.get(&mesh_h).cloned() else { continue };
                for (batch_index, batch) in list.batcher.batches().iter().enumerate() {
                    let Some(merged) = merge_mesh_instances(&src_mesh, batch) else {
                        warn!("Tilemap render: mesh for {:?} has no Float32x3 positions; skipping.", list.tile);
                        break;
                    };
                    let stats = BatchStats {
                        instance_count: batch.len() as u32,
                        merged_vertex_count: merged.count_vertices() as u32,
                    };
                    let e = commands
                        .spawn((
                            Mesh3d(meshes.add(merged)),
                            MeshMaterial3d(mat_h.clone()),
                            Transform::IDENTITY,
                            Visibility::Visible,
                            TileBatch { tilemap: map_entity, tile: list.tile, material_index, batch_index },
                            stats,
                            Name::new(format!("Tile batch {:?} / {} / {}", list.tile, material_index, batch_index)),
                        ))
                        .id();
                    spawned.push(e);
                }
            } else {
                for (i, m) in list.batcher.instances().iter().enumerate() {
                    let e = commands
                        .spawn((
                            Mesh3d(mesh_h.clone()),
                            MeshMaterial3d(mat_h.clone()),
                            Transform::from_matrix(*m),
                            Visibility::Visible,
                            TileBatch { tilemap: map_entity, tile: list.tile, material_index, batch_index: i },
                            BatchStats { instance_count: 1, merged_vertex_count: 0 },
                        ))
                        .id();
                    spawned.push(e);
                }
            }
        }

        debug!(
            "Tilemap render: rebuilt {:?} with {} tile types, {} draw entities",
            map_entity,
            lists.len(),
            spawned.len()
        );
        state.entities = spawned;
        state.dirty = false;
        rebuilt += 1;
    }
}

/// Despawn draw entities whose tilemap went away.
pub fn cleanup_batches_on_tilemap_removed(
    mut removed: RemovedComponents<Tilemap>,
    mut commands: Commands,
    q: Query<(Entity, &TileBatch)>,
) {
    let gone: Vec<Entity> = removed.read().collect();
    if gone.is_empty() { return; }
    for (e, batch) in q.iter() {
        if gone.contains(&batch.tilemap) {
            commands.entity(e).despawn();
        }
    }
}

/// Drop cached handles when the catalog is reloaded.
pub fn invalidate_cache_on_catalog_change(
    mut events: EventReader<AssetEvent<TileCatalog>>,
    mut cache: ResMut<TileRenderAssets>,
    mut q: Query<&mut TilemapRenderState>,
) {
    let mut changed = false;
    for ev in events.read() {
        if let AssetEvent::Modified { id } | AssetEvent::Removed { id } = ev {
            cache.by_key.retain(|(cid, _, _), _| cid != id);
            changed = true;
        }
    }
    if changed {
        for mut state in q.iter_mut() {
            state.mark_dirty();
        }
    }
}

fn resolve_mesh(mesh: &TileMesh, assets: &AssetServer, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
    match mesh {
        TileMesh::Asset(path) => assets.load(path.as_str()),
        TileMesh::Cuboid(size) => meshes.add(Cuboid::from_size(*size)),
    }
}

fn resolve_material(
    def: &TileMaterialDef,
    assets: &AssetServer,
    materials: &mut Assets<StandardMaterial>,
) -> Handle<StandardMaterial> {
    if let Some(path) = &def.path {
        return assets.load(path.as_str());
    }
    let [r, g, b, a] = def.base_color.unwrap_or([1.0, 1.0, 1.0, 1.0]);
    materials.add(StandardMaterial { base_color: Color::srgba(r, g, b, a), ..default() })
}

/// Bake one mesh per batch: the source mesh copied under every instance matrix.
/// Positions are transformed, normals go through the inverse-transpose so
/// non-uniform tile scales keep them perpendicular, UVs are copied.
pub fn merge_mesh_instances(src: &Mesh, instances: &[Mat4]) -> Option<Mesh> {
    let positions: Vec<[f32; 3]> = match src.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(v) => v.clone(),
        _ => return None,
    };

    let normals: Option<Vec<[f32; 3]>> = src
        .attribute(Mesh::ATTRIBUTE_NORMAL)
        .and_then(|vals| match vals {
            VertexAttributeValues::Float32x3(v) => Some(v.clone()),
            _ => None,
        });

    let uvs: Option<Vec<[f32; 2]>> = src
        .attribute(Mesh::ATTRIBUTE_UV_0)
        .and_then(|vals| match vals {
            VertexAttributeValues::Float32x2(v) => Some(v.clone()),
            _ => None,
        });

    let src_indices: Option<Vec<u32>> = match src.indices() {
        Some(Indices::U32(v)) => Some(v.clone()),
        Some(Indices::U16(v)) => Some(v.iter().map(|&x| x as u32).collect()),
        None => None,
    };

    let src_vtx = positions.len() as u32;
    let inst_n = instances.len().max(1);

    let mut out_positions = Vec::with_capacity(src_vtx as usize * inst_n);
    let mut out_normals: Option<Vec<[f32; 3]>> = normals.as_ref().map(|_| Vec::with_capacity(src_vtx as usize * inst_n));
    let mut out_uvs: Option<Vec<[f32; 2]>> = uvs.as_ref().map(|_| Vec::with_capacity(src_vtx as usize * inst_n));
    let mut out_indices: Vec<u32> = Vec::with_capacity(src_indices.as_ref().map(|ix| ix.len()).unwrap_or(0) * inst_n);

    for (inst_id, m) in instances.iter().enumerate() {
        let normal_matrix = Mat3::from_mat4(*m).inverse().transpose();
        for (i, p) in positions.iter().enumerate() {
            out_positions.push(m.transform_point3(Vec3::from_array(*p)).to_array());

            if let (Some(src_n), Some(dst_n)) = (normals.as_ref(), out_normals.as_mut()) {
                let n = (normal_matrix * Vec3::from_array(src_n[i])).normalize_or_zero();
                dst_n.push(n.to_array());
            }
            if let (Some(src_uv), Some(dst_uv)) = (uvs.as_ref(), out_uvs.as_mut()) {
                dst_uv.push(src_uv[i]);
            }
        }

        if let Some(ix) = &src_indices {
            let base = (inst_id as u32) * src_vtx;
            out_indices.extend(ix.iter().map(|&i| i + base));
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, out_positions);
    if let Some(n) = out_normals { mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, n); }
    if let Some(uv) = out_uvs { mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uv); }
    if src_indices.is_some() { mesh.insert_indices(Indices::U32(out_indices)); }
    Some(mesh)
}
