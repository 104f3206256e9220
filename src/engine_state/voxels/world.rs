//! # World Module
//!
//! This module provides the `World` struct, the registry of loaded chunks. It owns every chunk,
//! maintains the neighbor graph between them, and is the only place that edits voxel data once a
//! chunk has been generated.
//!
//! ## Architecture
//!
//! - Loaded chunks live in a hash map keyed by grid position. Neighbor links are positions, not
//!   references, so removing a chunk never leaves a dangling pointer behind. It only leaves
//!   back-references that `evict` clears in the same call.
//! - Positions whose terrain is being generated are tracked in a separate `loading` set. A
//!   position is never both loading and loaded.
//! - Evicted chunk data goes into an LRU cache, so a cell the viewer returns to comes back with
//!   its edits and lights intact.
//!
//! ## Meshes
//!
//! Any change a chunk's mesh depends on (its blocks, its light, the voxels just across a linked
//! face, or its set of links) flags the chunk dirty. `rebuild_dirty_meshes` is the single place
//! mesh sinks are created, built, finished and torn down, which lets the owner run it on the
//! context that owns graphics resources.
//!
//! ## Invariants
//!
//! - Links are symmetric: `a.neighbor(side) == Some(b)` iff `b.neighbor(side.opposite()) == Some(a)`.
//! - `neighbor_count` equals the number of linked sides.
//! - Linked chunks are face-adjacent and both present in the registry.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use cgmath::Point3;
use lru::LruCache;

use super::block::{block_side::BlockSide, block_type::BlockType};
use super::chunk::{
    split_world_voxel,
    storage::{voxel_index, voxel_index_unchecked, voxel_position},
    Chunk, ChunkData, ChunkPosition, CHUNK_DIMENSION,
};
use super::lighting::{self, LightVolume, VoxelAddress};
use crate::engine_state::config::WorldConfig;
use crate::engine_state::error::VoxelError;
use crate::engine_state::rendering::meshing::{CulledMesher, MeshFactory, MeshSink, MeshStats};

/// Default capacity of the evicted-chunk cache.
pub const DEFAULT_EVICTED_CHUNK_CACHE: usize = 256;

/// What one call to [`World::rebuild_dirty_meshes`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshRebuildReport {
    /// Chunks that received a new mesh
    pub rebuilt: usize,
    /// Meshes torn down, replaced and retired ones together
    pub torn_down: usize,
    /// Geometry emitted across all rebuilt chunks
    pub stats: MeshStats,
}

/// The registry of loaded chunks.
pub struct World {
    chunks: HashMap<ChunkPosition, Chunk>,
    loading: HashSet<ChunkPosition>,
    /// Positions whose generation failed. They are not requested again.
    failed: HashSet<ChunkPosition>,
    evicted: Option<LruCache<ChunkPosition, ChunkData>>,
    /// Meshes of evicted chunks, waiting for teardown on the mesh context.
    retired_meshes: Vec<Box<dyn MeshSink>>,
    cross_chunk_lighting: bool,
}

impl World {
    /// Creates an empty world with cross-chunk lighting and the default eviction cache.
    pub fn new() -> Self {
        World::with_settings(DEFAULT_EVICTED_CHUNK_CACHE, true)
    }

    /// Creates an empty world configured from `config`.
    pub fn with_config(config: &WorldConfig) -> Self {
        World::with_settings(config.evicted_chunk_cache, config.cross_chunk_lighting)
    }

    /// # Arguments
    /// * `evicted_chunk_cache` - Number of evicted chunks to remember, `0` to remember none
    /// * `cross_chunk_lighting` - Whether light placement continues into linked neighbors
    pub fn with_settings(evicted_chunk_cache: usize, cross_chunk_lighting: bool) -> Self {
        World {
            chunks: HashMap::new(),
            loading: HashSet::new(),
            failed: HashSet::new(),
            evicted: NonZeroUsize::new(evicted_chunk_cache).map(LruCache::new),
            retired_meshes: Vec::new(),
            cross_chunk_lighting,
        }
    }

    /// Retrieves the chunk at the specified grid position.
    ///
    /// # Returns
    /// `None` if no chunk is loaded there, which callers treat as "needs creation".
    pub fn get_chunk_at(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    pub fn contains(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Positions of all loaded chunks in a fixed order (x, then y, then z).
    pub fn positions(&self) -> Vec<ChunkPosition> {
        let mut positions: Vec<_> = self.chunks.keys().copied().collect();
        positions.sort_by_key(|p| (p.x, p.y, p.z));
        positions
    }

    pub fn is_loading(&self, position: ChunkPosition) -> bool {
        self.loading.contains(&position)
    }

    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }

    /// Marks a position as being generated.
    ///
    /// # Returns
    /// `false` if the position is already loaded or already loading.
    pub fn mark_loading(&mut self, position: ChunkPosition) -> bool {
        if self.chunks.contains_key(&position) {
            return false;
        }
        self.loading.insert(position)
    }

    /// Drops the loading mark after a failed generation and remembers the failure.
    /// Linkage is left untouched.
    ///
    /// # Returns
    /// `false` if the position was not loading.
    pub fn mark_generation_failed(&mut self, position: ChunkPosition) -> bool {
        if !self.loading.remove(&position) {
            return false;
        }
        self.failed.insert(position);
        true
    }

    /// Whether generation already failed for `position`. Terrain samplers are deterministic, so
    /// such a cell would fail again.
    pub fn has_failed(&self, position: ChunkPosition) -> bool {
        self.failed.contains(&position)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of evicted chunks currently remembered.
    pub fn cached_count(&self) -> usize {
        self.evicted.as_ref().map_or(0, LruCache::len)
    }

    /// Removes and returns remembered data for an evicted position.
    pub fn take_cached(&mut self, position: ChunkPosition) -> Option<ChunkData> {
        self.evicted.as_mut()?.pop(&position)
    }

    /// Inserts a generated chunk and links it to every loaded face-adjacent chunk.
    ///
    /// Clears the loading mark for `position`.
    ///
    /// # Returns
    /// `false`, leaving the world unchanged, if a chunk is already loaded there.
    pub fn insert_chunk(&mut self, position: ChunkPosition, data: ChunkData) -> bool {
        self.loading.remove(&position);
        if self.chunks.contains_key(&position) {
            log::warn!("Chunk {:?} is already loaded, dropping duplicate", position);
            return false;
        }

        self.chunks.insert(position, Chunk::new(position, data));
        for side in BlockSide::all() {
            self.link(position, side);
        }
        true
    }

    /// Links the chunk at `position` with the loaded chunk across `side`, in both directions.
    ///
    /// Both chunks gain one neighbor and are flagged for a mesh rebuild.
    ///
    /// # Returns
    /// `false` if either chunk is missing or either slot is already linked.
    pub fn link(&mut self, position: ChunkPosition, side: BlockSide) -> bool {
        let other = position + side.offset();
        let (Some(a), Some(b)) = (self.chunks.get(&position), self.chunks.get(&other)) else {
            return false;
        };
        if a.neighbor(side).is_some() || b.neighbor(side.opposite()).is_some() {
            return false;
        }

        if let Some(a) = self.chunks.get_mut(&position) {
            a.set_neighbor(side, other);
            a.mark_mesh_dirty();
        }
        if let Some(b) = self.chunks.get_mut(&other) {
            b.set_neighbor(side.opposite(), position);
            b.mark_mesh_dirty();
        }
        true
    }

    /// Removes a chunk from the registry.
    ///
    /// Every linked neighbor loses its back-reference, one from its count, and is flagged for a
    /// mesh rebuild. The chunk's mesh is retired for teardown by the next mesh rebuild, and its
    /// data is remembered in the eviction cache.
    ///
    /// # Returns
    /// `false` if nothing was loaded at `position`.
    pub fn evict(&mut self, position: ChunkPosition) -> bool {
        let Some(mut chunk) = self.chunks.remove(&position) else {
            return false;
        };

        for side in BlockSide::all() {
            let Some(neighbor_position) = chunk.clear_neighbor(side) else {
                continue;
            };
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_position) {
                neighbor.clear_neighbor(side.opposite());
                neighbor.mark_mesh_dirty();
            }
        }

        if let Some(mesh) = chunk.take_mesh() {
            self.retired_meshes.push(mesh);
        }
        if let Some(cache) = self.evicted.as_mut() {
            cache.put(position, chunk.data);
        }
        true
    }

    /// Block type at an integer world voxel.
    pub fn block_at(&self, world_voxel: Point3<i32>) -> Result<BlockType, VoxelError> {
        let (position, local) = split_world_voxel(world_voxel);
        let chunk = self
            .chunks
            .get(&position)
            .ok_or(VoxelError::ChunkNotLoaded(position))?;
        chunk.data.blocks.lookup(local)
    }

    /// Torchlight level at an integer world voxel.
    pub fn torchlight_at(&self, world_voxel: Point3<i32>) -> Result<u8, VoxelError> {
        let (position, local) = split_world_voxel(world_voxel);
        let chunk = self
            .chunks
            .get(&position)
            .ok_or(VoxelError::ChunkNotLoaded(position))?;
        chunk.data.light.torchlight(local)
    }

    /// Writes a block at an integer world voxel.
    ///
    /// Flags the owning chunk, and any linked neighbor whose faces border the voxel, for a mesh
    /// rebuild.
    ///
    /// Lighting is not recomputed: a voxel made solid keeps its torchlight level, and light
    /// placed earlier does not flow into a voxel made empty.
    pub fn set_block(
        &mut self,
        world_voxel: Point3<i32>,
        block_type: BlockType,
    ) -> Result<(), VoxelError> {
        let (position, local) = split_world_voxel(world_voxel);
        let chunk = self
            .chunks
            .get_mut(&position)
            .ok_or(VoxelError::ChunkNotLoaded(position))?;
        chunk.data.blocks.set(local, block_type)?;
        chunk.mark_mesh_dirty();

        let local = local.cast::<usize>().unwrap_or(Point3::new(0, 0, 0));
        let bordering: Vec<_> = boundary_sides(local)
            .filter_map(|side| chunk.neighbor(side))
            .collect();
        for neighbor in bordering {
            if let Some(neighbor) = self.chunks.get_mut(&neighbor) {
                neighbor.mark_mesh_dirty();
            }
        }
        Ok(())
    }

    /// Places a torchlight source at an integer world voxel and floods it outwards.
    ///
    /// With cross-chunk lighting enabled the flood continues through linked neighbors;
    /// otherwise it stops at the source chunk's faces.
    ///
    /// # Returns
    /// The number of voxels written.
    pub fn place_light(
        &mut self,
        world_voxel: Point3<i32>,
        intensity: u8,
    ) -> Result<usize, VoxelError> {
        let (position, local) = split_world_voxel(world_voxel);
        if !self.chunks.contains_key(&position) {
            return Err(VoxelError::ChunkNotLoaded(position));
        }
        let index = voxel_index(local)?;
        let source = VoxelAddress::new(position, voxel_position(index));

        let mut volume = WorldLightVolume {
            chunks: &mut self.chunks,
            cross_chunk: self.cross_chunk_lighting,
            touched: HashSet::new(),
        };
        let written = lighting::place_light(&mut volume, source, intensity)?;

        let touched = volume.touched;
        for position in touched {
            if let Some(chunk) = self.chunks.get_mut(&position) {
                chunk.mark_mesh_dirty();
            }
        }
        Ok(written)
    }

    /// Number of chunks waiting for a mesh rebuild.
    pub fn dirty_count(&self) -> usize {
        self.chunks.values().filter(|c| c.is_mesh_dirty()).count()
    }

    /// Tears down retired meshes, then rebuilds the mesh of every dirty chunk.
    ///
    /// Each rebuild creates a fresh sink, streams the chunk into it, finishes it, installs it and
    /// only then tears down the mesh it replaces.
    pub fn rebuild_dirty_meshes(&mut self, factory: &dyn MeshFactory) -> MeshRebuildReport {
        let mut report = MeshRebuildReport {
            torn_down: self.tear_down_retired(),
            ..MeshRebuildReport::default()
        };

        let mut dirty: Vec<_> = self
            .chunks
            .values()
            .filter(|c| c.is_mesh_dirty())
            .map(|c| c.position)
            .collect();
        dirty.sort_by_key(|p| (p.x, p.y, p.z));

        for position in dirty {
            let Some(chunk) = self.chunks.get(&position) else {
                continue;
            };
            let neighbors = BlockSide::all().map(|side| {
                chunk
                    .neighbor(side)
                    .and_then(|n| self.chunks.get(&n))
                    .map(|n| &n.data)
            });

            let mut sink = factory.create_mesh(position);
            let stats = CulledMesher::new(&chunk.data, chunk.origin, neighbors).build(sink.as_mut());
            sink.finish();

            if let Some(chunk) = self.chunks.get_mut(&position) {
                if let Some(mut old) = chunk.replace_mesh(sink) {
                    old.tear_down();
                    report.torn_down += 1;
                }
            }
            report.rebuilt += 1;
            report.stats.quads += stats.quads;
            report.stats.triangles += stats.triangles;
            report.stats.vertices += stats.vertices;
        }

        report
    }

    /// Tears down the meshes of evicted chunks.
    pub fn tear_down_retired(&mut self) -> usize {
        let count = self.retired_meshes.len();
        for mut mesh in self.retired_meshes.drain(..) {
            mesh.tear_down();
        }
        count
    }

    /// Tears down every mesh the world holds. Chunks stay loaded and are flagged dirty.
    pub fn tear_down_all_meshes(&mut self) -> usize {
        let mut count = self.tear_down_retired();
        for chunk in self.chunks.values_mut() {
            if let Some(mut mesh) = chunk.take_mesh() {
                mesh.tear_down();
                count += 1;
            }
            chunk.mark_mesh_dirty();
        }
        count
    }

    /// Checks the link invariants over the whole registry.
    ///
    /// # Returns
    /// A description of the first violation found.
    pub fn verify_linkage(&self) -> Result<(), String> {
        for position in self.positions() {
            let Some(chunk) = self.chunks.get(&position) else {
                continue;
            };
            let mut linked = 0;
            for side in BlockSide::all() {
                let Some(neighbor) = chunk.neighbor(side) else {
                    continue;
                };
                linked += 1;
                if neighbor != chunk.adjacent_position(side) {
                    return Err(format!("{position:?} {side:?} links to non-adjacent {neighbor:?}"));
                }
                match self.chunks.get(&neighbor) {
                    None => return Err(format!("{position:?} {side:?} links to unloaded {neighbor:?}")),
                    Some(other) if other.neighbor(side.opposite()) != Some(position) => {
                        return Err(format!("{neighbor:?} does not link back to {position:?}"));
                    }
                    Some(_) => {}
                }
            }
            if linked != chunk.neighbor_count() {
                return Err(format!(
                    "{position:?} counts {} neighbors but links {linked}",
                    chunk.neighbor_count()
                ));
            }
            if self.loading.contains(&position) {
                return Err(format!("{position:?} is both loaded and loading"));
            }
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Sides of a chunk whose face the local voxel touches.
fn boundary_sides(local: Point3<usize>) -> impl Iterator<Item = BlockSide> {
    let last = (CHUNK_DIMENSION - 1) as usize;
    let coords = [local.x, local.y, local.z];
    BlockSide::all().into_iter().filter(move |side| {
        let value = coords[side.axis()];
        if side.is_positive() {
            value == last
        } else {
            value == 0
        }
    })
}

/// The registry seen as one light volume spanning linked chunks.
struct WorldLightVolume<'a> {
    chunks: &'a mut HashMap<ChunkPosition, Chunk>,
    cross_chunk: bool,
    /// Chunks whose mesh reads a voxel this flood has written.
    touched: HashSet<ChunkPosition>,
}

impl LightVolume for WorldLightVolume<'_> {
    fn step(&self, from: VoxelAddress, side: BlockSide) -> Option<VoxelAddress> {
        let (local, inside) = from.step_local(side);
        if inside {
            return Some(VoxelAddress::new(from.chunk, local));
        }
        if !self.cross_chunk {
            return None;
        }
        let neighbor = self.chunks.get(&from.chunk)?.neighbor(side)?;
        Some(VoxelAddress::new(neighbor, local))
    }

    fn is_empty(&self, at: VoxelAddress) -> bool {
        self.chunks
            .get(&at.chunk)
            .is_some_and(|c| !c.data.blocks.is_solid_at(at.local.x, at.local.y, at.local.z))
    }

    fn torchlight(&self, at: VoxelAddress) -> u8 {
        self.chunks
            .get(&at.chunk)
            .map_or(0, |c| c.data.light.torchlight_at(at.index()))
    }

    fn set_torchlight(&mut self, at: VoxelAddress, level: u8) {
        let Some(chunk) = self.chunks.get_mut(&at.chunk) else {
            return;
        };
        chunk
            .data
            .light
            .set_torchlight_at(voxel_index_unchecked(at.local.x, at.local.y, at.local.z), level);

        self.touched.insert(at.chunk);
        for side in boundary_sides(at.local) {
            if let Some(neighbor) = chunk.neighbor(side) {
                self.touched.insert(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::recording::{MeshEvent, RecordingMeshFactory};
    use crate::engine_state::voxels::chunk::storage::VoxelGrid;

    fn p(x: i32, y: i32, z: i32) -> ChunkPosition {
        Point3::new(x, y, z)
    }

    fn world_with(positions: &[ChunkPosition]) -> World {
        let mut world = World::new();
        for position in positions {
            world.insert_chunk(*position, ChunkData::default());
        }
        world
    }

    #[test]
    fn linking_is_symmetric_and_counted_once() {
        let mut world = World::new();
        world.chunks.insert(p(0, 0, 0), Chunk::new(p(0, 0, 0), ChunkData::default()));
        world.chunks.insert(p(1, 0, 0), Chunk::new(p(1, 0, 0), ChunkData::default()));

        assert!(world.link(p(0, 0, 0), BlockSide::RIGHT));
        assert!(!world.link(p(0, 0, 0), BlockSide::RIGHT));
        assert!(!world.link(p(1, 0, 0), BlockSide::LEFT));

        let a = world.get_chunk_at(p(0, 0, 0)).unwrap();
        let b = world.get_chunk_at(p(1, 0, 0)).unwrap();
        assert_eq!(a.neighbor(BlockSide::RIGHT), Some(p(1, 0, 0)));
        assert_eq!(b.neighbor(BlockSide::LEFT), Some(p(0, 0, 0)));
        assert_eq!(a.neighbor_count(), 1);
        assert_eq!(b.neighbor_count(), 1);
        assert_eq!(world.verify_linkage(), Ok(()));
    }

    #[test]
    fn linking_to_a_missing_chunk_fails() {
        let mut world = world_with(&[p(0, 0, 0)]);
        assert!(!world.link(p(0, 0, 0), BlockSide::TOP));
        assert_eq!(world.get_chunk_at(p(0, 0, 0)).unwrap().neighbor_count(), 0);
    }

    #[test]
    fn insert_links_every_loaded_neighbor() {
        let world = world_with(&[p(1, 0, 0), p(-1, 0, 0), p(0, 1, 0), p(0, 0, 0), p(5, 5, 5)]);
        let center = world.get_chunk_at(p(0, 0, 0)).unwrap();
        assert_eq!(center.neighbor_count(), 3);
        assert_eq!(center.neighbor(BlockSide::TOP), Some(p(0, 1, 0)));
        assert_eq!(world.get_chunk_at(p(5, 5, 5)).unwrap().neighbor_count(), 0);
        assert_eq!(world.verify_linkage(), Ok(()));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut world = world_with(&[p(0, 0, 0)]);
        world.set_block(Point3::new(1, 1, 1), BlockType::STONE).unwrap();
        assert!(!world.insert_chunk(p(0, 0, 0), ChunkData::default()));
        assert_eq!(world.block_at(Point3::new(1, 1, 1)), Ok(BlockType::STONE));
    }

    #[test]
    fn evict_clears_back_references() {
        let mut world = world_with(&[p(0, 0, 0), p(1, 0, 0), p(0, 0, 1)]);
        assert!(world.evict(p(0, 0, 0)));

        assert!(world.get_chunk_at(p(0, 0, 0)).is_none());
        let right = world.get_chunk_at(p(1, 0, 0)).unwrap();
        assert_eq!(right.neighbor(BlockSide::LEFT), None);
        assert_eq!(right.neighbor_count(), 0);
        assert_eq!(world.get_chunk_at(p(0, 0, 1)).unwrap().neighbor_count(), 0);
        assert_eq!(world.verify_linkage(), Ok(()));
        assert!(!world.evict(p(0, 0, 0)));
    }

    #[test]
    fn evicted_data_is_cached_for_reload() {
        let mut world = world_with(&[p(0, 0, 0)]);
        world.set_block(Point3::new(3, 3, 3), BlockType::STONE).unwrap();
        world.evict(p(0, 0, 0));
        assert_eq!(world.cached_count(), 1);

        let data = world.take_cached(p(0, 0, 0)).unwrap();
        assert_eq!(data.blocks.lookup(Point3::new(3, 3, 3)), Ok(BlockType::STONE));
        assert_eq!(world.take_cached(p(0, 0, 0)), None);
    }

    #[test]
    fn zero_capacity_disables_the_cache() {
        let mut world = World::with_settings(0, true);
        world.insert_chunk(p(0, 0, 0), ChunkData::default());
        world.evict(p(0, 0, 0));
        assert_eq!(world.cached_count(), 0);
        assert_eq!(world.take_cached(p(0, 0, 0)), None);
    }

    #[test]
    fn loading_and_loaded_are_exclusive() {
        let mut world = world_with(&[p(0, 0, 0)]);
        assert!(!world.mark_loading(p(0, 0, 0)));
        assert!(world.mark_loading(p(1, 0, 0)));
        assert!(!world.mark_loading(p(1, 0, 0)));
        assert!(world.insert_chunk(p(1, 0, 0), ChunkData::default()));
        assert!(!world.is_loading(p(1, 0, 0)));
        assert_eq!(world.verify_linkage(), Ok(()));
    }

    #[test]
    fn failed_generation_is_remembered() {
        let mut world = World::new();
        assert!(!world.mark_generation_failed(p(2, 0, 0)));
        world.mark_loading(p(2, 0, 0));
        assert!(world.mark_generation_failed(p(2, 0, 0)));
        assert!(!world.is_loading(p(2, 0, 0)));
        assert!(world.has_failed(p(2, 0, 0)));
        assert_eq!(world.failed_count(), 1);
    }

    #[test]
    fn block_edits_leave_light_untouched() {
        let mut world = world_with(&[p(0, 0, 0)]);
        let torch = Point3::new(5, 5, 5);
        world.place_light(torch, 15).unwrap();
        world.set_block(Point3::new(6, 5, 5), BlockType::STONE).unwrap();
        assert_eq!(world.torchlight_at(Point3::new(6, 5, 5)), Ok(14));

        world.set_block(Point3::new(6, 5, 5), BlockType::EMPTY).unwrap();
        assert_eq!(world.torchlight_at(Point3::new(6, 5, 5)), Ok(14));
    }

    #[test]
    fn block_edits_on_a_face_dirty_the_neighbor() {
        let factory = RecordingMeshFactory::new();
        let mut world = world_with(&[p(0, 0, 0), p(1, 0, 0)]);
        world.rebuild_dirty_meshes(&factory);
        assert_eq!(world.dirty_count(), 0);

        world.set_block(Point3::new(10, 10, 10), BlockType::GRASS).unwrap();
        assert_eq!(world.dirty_count(), 1);
        world.rebuild_dirty_meshes(&factory);

        world.set_block(Point3::new(31, 10, 10), BlockType::GRASS).unwrap();
        assert_eq!(world.dirty_count(), 2);
    }

    #[test]
    fn edits_outside_loaded_chunks_fail() {
        let mut world = world_with(&[p(0, 0, 0)]);
        assert_eq!(
            world.set_block(Point3::new(-1, 0, 0), BlockType::GRASS),
            Err(VoxelError::ChunkNotLoaded(p(-1, 0, 0)))
        );
        assert_eq!(
            world.place_light(Point3::new(0, 40, 0), 15),
            Err(VoxelError::ChunkNotLoaded(p(0, 1, 0)))
        );
    }

    #[test]
    fn light_crosses_into_linked_neighbors() {
        let mut world = world_with(&[p(0, 0, 0), p(1, 0, 0)]);
        world.place_light(Point3::new(30, 16, 16), 15).unwrap();

        assert_eq!(world.torchlight_at(Point3::new(31, 16, 16)), Ok(14));
        assert_eq!(world.torchlight_at(Point3::new(32, 16, 16)), Ok(13));
        assert_eq!(world.torchlight_at(Point3::new(43, 16, 16)), Ok(2));
        assert_eq!(world.torchlight_at(Point3::new(45, 16, 16)), Ok(0));
    }

    #[test]
    fn light_stays_local_when_cross_chunk_lighting_is_off() {
        let mut world = World::with_settings(0, false);
        world.insert_chunk(p(0, 0, 0), ChunkData::default());
        world.insert_chunk(p(1, 0, 0), ChunkData::default());
        world.place_light(Point3::new(30, 16, 16), 15).unwrap();

        assert_eq!(world.torchlight_at(Point3::new(31, 16, 16)), Ok(14));
        assert_eq!(world.torchlight_at(Point3::new(32, 16, 16)), Ok(0));
    }

    #[test]
    fn light_does_not_enter_unlinked_space() {
        let mut world = world_with(&[p(0, 0, 0)]);
        let written = world.place_light(Point3::new(31, 16, 16), 2).unwrap();
        // Source plus the five in-chunk neighbors.
        assert_eq!(written, 6);
    }

    #[test]
    fn rebuild_replaces_meshes_in_contract_order() {
        let factory = RecordingMeshFactory::new();
        let mut world = World::new();
        let data = ChunkData {
            blocks: VoxelGrid::filled(BlockType::GRASS),
            ..ChunkData::default()
        };
        world.insert_chunk(p(0, 0, 0), data);

        let report = world.rebuild_dirty_meshes(&factory);
        assert_eq!(report.rebuilt, 1);
        assert_eq!(report.stats.quads, 6 * 32 * 32);
        assert_eq!(world.rebuild_dirty_meshes(&factory).rebuilt, 0);

        world.set_block(Point3::new(5, 5, 5), BlockType::EMPTY).unwrap();
        let report = world.rebuild_dirty_meshes(&factory);
        assert_eq!(report.rebuilt, 1);
        assert_eq!(report.torn_down, 1);

        let meshes = factory.meshes_for(p(0, 0, 0));
        assert_eq!(meshes.len(), 2);
        assert!(meshes[0].is_finished() && meshes[0].is_torn_down());
        assert!(meshes[1].is_finished() && !meshes[1].is_torn_down());
        assert_eq!(meshes[0].check_face_order(), Ok(6 * 32 * 32));
        assert_eq!(meshes[1].check_face_order(), Ok(6 * 32 * 32 + 6));
    }

    #[test]
    fn evicted_meshes_are_torn_down_on_the_next_rebuild() {
        let factory = RecordingMeshFactory::new();
        let mut world = world_with(&[p(0, 0, 0), p(0, 1, 0)]);
        world.rebuild_dirty_meshes(&factory);

        world.evict(p(0, 1, 0));
        let evicted_mesh = factory.meshes_for(p(0, 1, 0)).remove(0);
        assert!(!evicted_mesh.is_torn_down());

        let report = world.rebuild_dirty_meshes(&factory);
        assert!(evicted_mesh.is_torn_down());
        assert_eq!(evicted_mesh.events().last(), Some(&MeshEvent::TearDown));
        // The remaining chunk lost a link, so it was rebuilt.
        assert_eq!(report.rebuilt, 1);
        assert_eq!(report.torn_down, 2);
    }
}
