//! # Chunk Iteration Module
//!
//! This module provides an iterator over the solid voxels of a chunk.
//!
//! ## Occupancy-Driven Iteration
//!
//! The `ChunkBlockIterator` walks the set bits of the grid's occupancy mask instead of the dense
//! block array, so empty space costs one word scan per 64 voxels. Each set bit's index decodes
//! back into a local coordinate, and the block type is read from the dense array at the same
//! index. Voxels come out in storage order: x fastest, then y, then z.

use bitvec::slice::IterOnes;
use cgmath::Point3;

use super::storage::{voxel_position, VoxelGrid};
use crate::engine_state::voxels::block::block_type::BlockType;

/// An iterator over all non-empty voxels of a grid.
///
/// Yields the local coordinate, the linear storage index and the block type of each voxel.
pub struct ChunkBlockIterator<'a> {
    /// The grid being iterated over
    grid: &'a VoxelGrid,
    /// Remaining set bits of the occupancy mask
    solid_bits: IterOnes<'a, usize, bitvec::order::Lsb0>,
}

/// One solid voxel produced by [`ChunkBlockIterator`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolidVoxel {
    pub local: Point3<usize>,
    pub index: usize,
    pub block_type: BlockType,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates an iterator positioned before the first solid voxel of `grid`.
    pub fn new(grid: &'a VoxelGrid) -> Self {
        ChunkBlockIterator {
            grid,
            solid_bits: grid.solid_array().iter_ones(),
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = SolidVoxel;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.solid_bits.next()?;
        Some(SolidVoxel {
            local: voxel_position(index),
            index,
            block_type: self.grid.block_at(index),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.solid_bits.size_hint()
    }
}

impl VoxelGrid {
    /// Iterates the solid voxels of this grid in storage order.
    pub fn iter_solid(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }
}
