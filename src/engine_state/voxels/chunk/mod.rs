//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a cube of `CHUNK_DIMENSION`³ voxels at a fixed grid
//! position, together with its links to face-adjacent chunks and the mesh currently drawn for it.
//!
//! ## Coordinates
//!
//! - **Chunk position**: integer grid cell of the chunk (`ChunkPosition`).
//! - **Chunk origin**: world-space coordinate of local voxel `(0, 0, 0)`, i.e.
//!   `position * CHUNK_DIMENSION`.
//! - **Local coordinate**: `0..CHUNK_DIMENSION` on each axis.
//! - **World voxel**: integer world coordinate, `origin + local`.
//!
//! A voxel is drawn as a unit cube centered on its world coordinate.
//!
//! ## Neighbor Links
//!
//! A chunk never owns its neighbors. Each of its six sides holds either nothing or the grid
//! position of the linked chunk, which the world registry resolves on demand. The world keeps
//! links symmetric: when this chunk's `RIGHT` slot names `B`, `B`'s `LEFT` slot names this chunk.
//! `neighbor_count` always equals the number of filled slots.

use cgmath::{Point3, Vector3};

use super::block::block_side::BlockSide;
use crate::engine_state::rendering::meshing::MeshSink;

pub mod chunk_iteration;
pub mod storage;

pub use storage::ChunkData;

/// Log2 of the chunk edge length.
pub const CHUNK_DIMENSION_LOG2: u32 = 5;
/// The dimension (width, height, depth) of a chunk in voxels.
pub const CHUNK_DIMENSION: i32 = 1 << CHUNK_DIMENSION_LOG2;
/// The number of voxels in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of voxels in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Integer grid position of a chunk; also its key in the world registry.
pub type ChunkPosition = Point3<i32>;

/// World coordinate of a chunk's local voxel `(0, 0, 0)`.
pub fn chunk_origin(position: ChunkPosition) -> Point3<f64> {
    Point3::new(
        (position.x * CHUNK_DIMENSION) as f64,
        (position.y * CHUNK_DIMENSION) as f64,
        (position.z * CHUNK_DIMENSION) as f64,
    )
}

/// Center used for draw distance checks: the origin shifted by half a chunk on every axis.
pub fn chunk_center(position: ChunkPosition) -> Point3<f64> {
    let half = CHUNK_DIMENSION as f64 * 0.5;
    chunk_origin(position) + Vector3::new(half, half, half)
}

/// Grid cell of the chunk containing a world-space point.
pub fn chunk_containing(point: Point3<f64>) -> ChunkPosition {
    let dimension = CHUNK_DIMENSION as f64;
    Point3::new(
        (point.x / dimension).floor() as i32,
        (point.y / dimension).floor() as i32,
        (point.z / dimension).floor() as i32,
    )
}

/// Splits an integer world voxel coordinate into its chunk and in-range local coordinate.
pub fn split_world_voxel(world_voxel: Point3<i32>) -> (ChunkPosition, Point3<i32>) {
    let chunk = Point3::new(
        world_voxel.x.div_euclid(CHUNK_DIMENSION),
        world_voxel.y.div_euclid(CHUNK_DIMENSION),
        world_voxel.z.div_euclid(CHUNK_DIMENSION),
    );
    let local = Point3::new(
        world_voxel.x.rem_euclid(CHUNK_DIMENSION),
        world_voxel.y.rem_euclid(CHUNK_DIMENSION),
        world_voxel.z.rem_euclid(CHUNK_DIMENSION),
    );
    (chunk, local)
}

/// Inverse of [`split_world_voxel`].
pub fn join_world_voxel(chunk: ChunkPosition, local: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk.x * CHUNK_DIMENSION + local.x,
        chunk.y * CHUNK_DIMENSION + local.y,
        chunk.z * CHUNK_DIMENSION + local.z,
    )
}

/// A loaded chunk of the world.
///
/// Chunks are the unit of streaming, meshing and eviction. The voxel data is owned here; the
/// mesh slot holds whatever sink the graphics context last built for this chunk.
pub struct Chunk {
    /// Grid position of this chunk (in chunk coordinates, not voxel coordinates).
    pub position: ChunkPosition,

    /// World coordinate of local voxel `(0, 0, 0)`.
    pub origin: Point3<f64>,

    /// Block types and light levels.
    pub data: ChunkData,

    /// Linked chunk per side, indexed by `BlockSide as usize`.
    neighbors: [Option<ChunkPosition>; 6],

    /// Number of filled `neighbors` slots.
    neighbor_count: usize,

    /// The mesh currently representing this chunk, once one has been built.
    mesh: Option<Box<dyn MeshSink>>,

    /// Set whenever data this chunk's mesh depends on has changed since the last build.
    mesh_dirty: bool,
}

impl Chunk {
    /// Creates an unlinked chunk holding `data`.
    ///
    /// The chunk starts with no mesh and is flagged for a mesh build.
    ///
    /// # Arguments
    /// * `position` - The grid position of the chunk
    /// * `data` - Generated or cached voxel data
    pub fn new(position: ChunkPosition, data: ChunkData) -> Self {
        Chunk {
            position,
            origin: chunk_origin(position),
            data,
            neighbors: [None; 6],
            neighbor_count: 0,
            mesh: None,
            mesh_dirty: true,
        }
    }

    /// The linked chunk across `side`, if any.
    pub fn neighbor(&self, side: BlockSide) -> Option<ChunkPosition> {
        self.neighbors[side as usize]
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    /// `true` once all six sides are linked.
    pub fn is_surrounded(&self) -> bool {
        self.neighbor_count == 6
    }

    /// Sides with no linked chunk.
    pub fn missing_sides(&self) -> impl Iterator<Item = BlockSide> + '_ {
        BlockSide::all()
            .into_iter()
            .filter(move |side| self.neighbors[*side as usize].is_none())
    }

    /// Grid position of the cell across `side`, linked or not.
    pub fn adjacent_position(&self, side: BlockSide) -> ChunkPosition {
        self.position + side.offset()
    }

    /// Fills an empty neighbor slot. Returns `false` if the slot was already taken.
    pub(in crate::engine_state::voxels) fn set_neighbor(
        &mut self,
        side: BlockSide,
        position: ChunkPosition,
    ) -> bool {
        let slot = &mut self.neighbors[side as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(position);
        self.neighbor_count += 1;
        true
    }

    /// Empties a neighbor slot, returning what it held.
    pub(in crate::engine_state::voxels) fn clear_neighbor(
        &mut self,
        side: BlockSide,
    ) -> Option<ChunkPosition> {
        let previous = self.neighbors[side as usize].take();
        if previous.is_some() {
            self.neighbor_count -= 1;
        }
        previous
    }

    pub fn is_mesh_dirty(&self) -> bool {
        self.mesh_dirty
    }

    /// Flags the chunk for a mesh rebuild on the next simulation step.
    pub fn mark_mesh_dirty(&mut self) {
        self.mesh_dirty = true;
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Installs a freshly built mesh and clears the dirty flag.
    ///
    /// # Returns
    /// The previous mesh, which the caller must tear down.
    pub fn replace_mesh(&mut self, mesh: Box<dyn MeshSink>) -> Option<Box<dyn MeshSink>> {
        self.mesh_dirty = false;
        self.mesh.replace(mesh)
    }

    /// Removes the current mesh without building a new one.
    pub fn take_mesh(&mut self) -> Option<Box<dyn MeshSink>> {
        self.mesh.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_voxels_split_with_floor_semantics() {
        assert_eq!(
            split_world_voxel(Point3::new(0, 31, 32)),
            (Point3::new(0, 0, 1), Point3::new(0, 31, 0))
        );
        assert_eq!(
            split_world_voxel(Point3::new(-1, -32, -33)),
            (Point3::new(-1, -1, -2), Point3::new(31, 0, 31))
        );
        let voxel = Point3::new(-70, 5, 100);
        let (chunk, local) = split_world_voxel(voxel);
        assert_eq!(join_world_voxel(chunk, local), voxel);
    }

    #[test]
    fn center_is_half_a_chunk_past_the_origin() {
        let position = Point3::new(1, -1, 0);
        assert_eq!(chunk_origin(position), Point3::new(32.0, -32.0, 0.0));
        assert_eq!(chunk_center(position), Point3::new(48.0, -16.0, 16.0));
        assert_eq!(chunk_containing(Point3::new(47.9, -0.1, 31.9)), position);
    }

    #[test]
    fn neighbor_slots_track_the_count() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), ChunkData::default());
        assert_eq!(chunk.missing_sides().count(), 6);

        assert!(chunk.set_neighbor(BlockSide::TOP, Point3::new(0, 1, 0)));
        assert!(!chunk.set_neighbor(BlockSide::TOP, Point3::new(0, 1, 0)));
        assert_eq!(chunk.neighbor_count(), 1);
        assert_eq!(chunk.neighbor(BlockSide::TOP), Some(Point3::new(0, 1, 0)));

        assert_eq!(chunk.clear_neighbor(BlockSide::TOP), Some(Point3::new(0, 1, 0)));
        assert_eq!(chunk.clear_neighbor(BlockSide::TOP), None);
        assert_eq!(chunk.neighbor_count(), 0);
    }

    #[test]
    fn new_chunks_start_dirty_without_a_mesh() {
        let chunk = Chunk::new(Point3::new(2, 0, 0), ChunkData::default());
        assert!(chunk.is_mesh_dirty());
        assert!(!chunk.has_mesh());
        assert_eq!(chunk.origin, Point3::new(64.0, 0.0, 0.0));
        assert_eq!(chunk.adjacent_position(BlockSide::LEFT), Point3::new(1, 0, 0));
    }
}
