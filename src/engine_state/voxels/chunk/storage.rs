//! # Chunk Storage Module
//!
//! Dense per-chunk storage for block types and light levels.
//!
//! ## Layout
//!
//! Both grids hold exactly `CHUNK_SIZE` entries addressed by a bit-interleaved linear index:
//!
//! ```text
//! index(x, y, z) = x | (y << CHUNK_DIMENSION_LOG2) | (z << 2 * CHUNK_DIMENSION_LOG2)
//! ```
//!
//! which is only valid for `0 <= x, y, z < CHUNK_DIMENSION`. The public accessors take signed
//! coordinates and return [`VoxelError::OutOfBounds`] for anything outside that range, so
//! callers that walk across chunk boundaries have to resolve the neighbor chunk first.
//!
//! ## Occupancy
//!
//! Next to the dense block array, `VoxelGrid` keeps a bit vector with one bit per voxel that is
//! set when the voxel is solid. It answers "is this voxel empty?" without decoding a block type
//! and lets iteration skip empty space with `iter_ones`.
//!
//! ## Light
//!
//! One byte per voxel: the high nibble is sunlight, the low nibble is torchlight. Setters reject
//! levels above 15, so both nibbles always stay in `0..=15`.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::{CHUNK_DIMENSION, CHUNK_DIMENSION_LOG2, CHUNK_SIZE};
use crate::engine_state::error::VoxelError;
use crate::engine_state::voxels::block::{block_type::BlockType, BlockTypeSize};

/// Highest level either light nibble can hold.
pub const MAX_LIGHT_LEVEL: u8 = 15;

const AXIS_MASK: usize = (CHUNK_DIMENSION - 1) as usize;

/// Linear index of an in-range chunk-local coordinate.
#[inline]
pub fn voxel_index_unchecked(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x <= AXIS_MASK && y <= AXIS_MASK && z <= AXIS_MASK);
    x | (y << CHUNK_DIMENSION_LOG2) | (z << (2 * CHUNK_DIMENSION_LOG2))
}

/// Linear index of a chunk-local coordinate.
///
/// # Errors
/// Returns [`VoxelError::OutOfBounds`] when any axis is outside `0..CHUNK_DIMENSION`.
pub fn voxel_index(local: Point3<i32>) -> Result<usize, VoxelError> {
    if !is_in_bounds(local) {
        return Err(VoxelError::OutOfBounds {
            x: local.x,
            y: local.y,
            z: local.z,
        });
    }
    Ok(voxel_index_unchecked(
        local.x as usize,
        local.y as usize,
        local.z as usize,
    ))
}

/// Inverse of [`voxel_index_unchecked`].
#[inline]
pub fn voxel_position(index: usize) -> Point3<usize> {
    Point3::new(
        index & AXIS_MASK,
        (index >> CHUNK_DIMENSION_LOG2) & AXIS_MASK,
        index >> (2 * CHUNK_DIMENSION_LOG2),
    )
}

pub fn is_in_bounds(local: Point3<i32>) -> bool {
    let range = 0..CHUNK_DIMENSION;
    range.contains(&local.x) && range.contains(&local.y) && range.contains(&local.z)
}

/// Block types of every voxel in a chunk, plus an occupancy bit per voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    /// Stored block ids, indexed by [`voxel_index`].
    blocks: Vec<BlockTypeSize>,
    /// Bit `i` is set iff `blocks[i]` is not `EMPTY`.
    solid_array: BitVec,
}

impl VoxelGrid {
    /// A grid with every voxel empty.
    pub fn empty() -> Self {
        Self::filled(BlockType::EMPTY)
    }

    /// A grid with every voxel set to `block_type`.
    pub fn filled(block_type: BlockType) -> Self {
        let size = CHUNK_SIZE as usize;
        VoxelGrid {
            blocks: vec![block_type.as_int(); size],
            solid_array: BitVec::repeat(block_type.is_solid(), size),
        }
    }

    /// Returns the block type at a chunk-local coordinate.
    pub fn lookup(&self, local: Point3<i32>) -> Result<BlockType, VoxelError> {
        let index = voxel_index(local)?;
        BlockType::from_int(self.blocks[index])
    }

    /// Writes the block type at a chunk-local coordinate.
    pub fn set(&mut self, local: Point3<i32>, block_type: BlockType) -> Result<(), VoxelError> {
        let index = voxel_index(local)?;
        self.set_at(index, block_type);
        Ok(())
    }

    /// Writes by linear index. The index must come from this module's index functions.
    pub(crate) fn set_at(&mut self, index: usize, block_type: BlockType) {
        self.blocks[index] = block_type.as_int();
        self.solid_array.set(index, block_type.is_solid());
    }

    /// Reads by linear index. Stored ids are only ever written from a `BlockType`.
    pub(crate) fn block_at(&self, index: usize) -> BlockType {
        BlockType::from_int(self.blocks[index]).unwrap_or(BlockType::EMPTY)
    }

    /// Occupancy test for an in-range coordinate.
    #[inline]
    pub fn is_solid_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid_array[voxel_index_unchecked(x, y, z)]
    }

    /// Number of non-empty voxels.
    pub fn solid_count(&self) -> usize {
        self.solid_array.count_ones()
    }

    pub(crate) fn solid_array(&self) -> &BitVec {
        &self.solid_array
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::empty()
    }
}

/// Packed sunlight/torchlight byte per voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct LightGrid {
    levels: Vec<u8>,
}

impl LightGrid {
    /// A grid with both nibbles at zero everywhere.
    pub fn dark() -> Self {
        LightGrid {
            levels: vec![0; CHUNK_SIZE as usize],
        }
    }

    /// The raw packed byte at a coordinate.
    pub fn lookup(&self, local: Point3<i32>) -> Result<u8, VoxelError> {
        Ok(self.levels[voxel_index(local)?])
    }

    pub fn sunlight(&self, local: Point3<i32>) -> Result<u8, VoxelError> {
        Ok(self.sunlight_at(voxel_index(local)?))
    }

    pub fn torchlight(&self, local: Point3<i32>) -> Result<u8, VoxelError> {
        Ok(self.torchlight_at(voxel_index(local)?))
    }

    pub fn set_sunlight(&mut self, local: Point3<i32>, level: u8) -> Result<(), VoxelError> {
        check_level(level)?;
        let index = voxel_index(local)?;
        self.set_sunlight_at(index, level);
        Ok(())
    }

    pub fn set_torchlight(&mut self, local: Point3<i32>, level: u8) -> Result<(), VoxelError> {
        check_level(level)?;
        let index = voxel_index(local)?;
        self.set_torchlight_at(index, level);
        Ok(())
    }

    #[inline]
    pub(crate) fn sunlight_at(&self, index: usize) -> u8 {
        (self.levels[index] >> 4) & 0xF
    }

    #[inline]
    pub(crate) fn torchlight_at(&self, index: usize) -> u8 {
        self.levels[index] & 0xF
    }

    #[inline]
    pub(crate) fn set_sunlight_at(&mut self, index: usize, level: u8) {
        self.levels[index] = (self.levels[index] & 0x0F) | ((level & 0xF) << 4);
    }

    #[inline]
    pub(crate) fn set_torchlight_at(&mut self, index: usize, level: u8) {
        self.levels[index] = (self.levels[index] & 0xF0) | (level & 0xF);
    }

    /// Brightest of the two nibbles, which is what the mesher shades with.
    #[inline]
    pub(crate) fn brightness_at(&self, index: usize) -> u8 {
        self.sunlight_at(index).max(self.torchlight_at(index))
    }
}

impl Default for LightGrid {
    fn default() -> Self {
        Self::dark()
    }
}

fn check_level(level: u8) -> Result<(), VoxelError> {
    if level > MAX_LIGHT_LEVEL {
        return Err(VoxelError::LightLevelOutOfRange(level));
    }
    Ok(())
}

/// Everything a chunk stores per voxel. This is the unit that terrain generation produces and
/// that the evicted-chunk cache keeps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkData {
    pub blocks: VoxelGrid,
    pub light: LightGrid,
}
