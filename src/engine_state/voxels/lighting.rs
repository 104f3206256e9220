//! # Lighting Module
//!
//! Torchlight propagation by breadth-first flood fill.
//!
//! ## Algorithm
//!
//! Placing a light writes the source level into the torchlight nibble of one voxel and queues it.
//! Each dequeued voxel with level `L` visits its six lattice neighbors; a neighbor that is empty
//! and currently at most `L - 2` is raised to `L - 1` and queued. Levels strictly decrease along
//! every path, so the fill stops on its own after at most `L` steps from the source.
//!
//! Only brightening happens here. A neighbor already within one level of `L` is left alone,
//! which also stops two overlapping lights from fighting over a voxel.
//!
//! ## Volumes
//!
//! The fill runs over any [`LightVolume`]. [`ChunkLightVolume`] confines it to a single chunk's
//! data. The world registry provides a volume that walks through linked neighbor chunks.

use std::collections::VecDeque;

use cgmath::Point3;

use super::block::block_side::BlockSide;
use super::chunk::storage::{is_in_bounds, voxel_index_unchecked, MAX_LIGHT_LEVEL};
use super::chunk::{ChunkData, ChunkPosition, CHUNK_DIMENSION};
use crate::engine_state::error::VoxelError;

/// A voxel addressed by its chunk and an in-range local coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoxelAddress {
    pub chunk: ChunkPosition,
    pub local: Point3<usize>,
}

impl VoxelAddress {
    pub fn new(chunk: ChunkPosition, local: Point3<usize>) -> Self {
        VoxelAddress { chunk, local }
    }

    /// Linear index into the chunk's grids.
    pub fn index(&self) -> usize {
        voxel_index_unchecked(self.local.x, self.local.y, self.local.z)
    }

    /// The neighbor across `side` when it lies in the same chunk, otherwise the coordinate it
    /// wraps to on the far side of the adjacent chunk along with `false`.
    pub fn step_local(&self, side: BlockSide) -> (Point3<usize>, bool) {
        let offset = side.offset();
        let next = Point3::new(
            self.local.x as i32 + offset.x,
            self.local.y as i32 + offset.y,
            self.local.z as i32 + offset.z,
        );
        let inside = is_in_bounds(next);
        let wrapped = Point3::new(
            next.x.rem_euclid(CHUNK_DIMENSION) as usize,
            next.y.rem_euclid(CHUNK_DIMENSION) as usize,
            next.z.rem_euclid(CHUNK_DIMENSION) as usize,
        );
        (wrapped, inside)
    }
}

/// Voxels the flood fill can read and brighten.
pub trait LightVolume {
    /// The voxel across `side` of `from`, or `None` where the volume ends.
    fn step(&self, from: VoxelAddress, side: BlockSide) -> Option<VoxelAddress>;

    /// Whether light may enter the voxel.
    fn is_empty(&self, at: VoxelAddress) -> bool;

    fn torchlight(&self, at: VoxelAddress) -> u8;

    fn set_torchlight(&mut self, at: VoxelAddress, level: u8);
}

/// Spreads torchlight of `intensity` from `source` through `volume`.
///
/// The source voxel is set to `intensity` whatever it held before.
///
/// # Returns
/// The number of voxels written, the source included.
///
/// # Errors
/// Returns [`VoxelError::LightLevelOutOfRange`] for an intensity above 15. Nothing is written
/// in that case.
pub fn place_light<V: LightVolume + ?Sized>(
    volume: &mut V,
    source: VoxelAddress,
    intensity: u8,
) -> Result<usize, VoxelError> {
    if intensity > MAX_LIGHT_LEVEL {
        return Err(VoxelError::LightLevelOutOfRange(intensity));
    }

    let mut queue = VecDeque::new();
    volume.set_torchlight(source, intensity);
    queue.push_back(source);
    let mut written = 1;

    while let Some(node) = queue.pop_front() {
        let level = volume.torchlight(node);
        for side in BlockSide::all() {
            let Some(next) = volume.step(node, side) else {
                continue;
            };
            if volume.is_empty(next) && volume.torchlight(next) + 2 <= level {
                volume.set_torchlight(next, level - 1);
                queue.push_back(next);
                written += 1;
            }
        }
    }

    Ok(written)
}

/// A single chunk's data as a light volume. Light stops at the chunk's faces.
pub struct ChunkLightVolume<'a> {
    position: ChunkPosition,
    data: &'a mut ChunkData,
}

impl<'a> ChunkLightVolume<'a> {
    pub fn new(position: ChunkPosition, data: &'a mut ChunkData) -> Self {
        ChunkLightVolume { position, data }
    }
}

impl LightVolume for ChunkLightVolume<'_> {
    fn step(&self, from: VoxelAddress, side: BlockSide) -> Option<VoxelAddress> {
        let (local, inside) = from.step_local(side);
        inside.then(|| VoxelAddress::new(self.position, local))
    }

    fn is_empty(&self, at: VoxelAddress) -> bool {
        !self.data.blocks.is_solid_at(at.local.x, at.local.y, at.local.z)
    }

    fn torchlight(&self, at: VoxelAddress) -> u8 {
        self.data.light.torchlight_at(at.index())
    }

    fn set_torchlight(&mut self, at: VoxelAddress, level: u8) {
        self.data.light.set_torchlight_at(at.index(), level);
    }
}
