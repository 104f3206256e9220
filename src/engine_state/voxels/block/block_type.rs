//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the conversion
//! from the compact stored representation.

use num_derive::FromPrimitive;

use super::BlockTypeSize;
use crate::engine_state::error::VoxelError;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the values stored in a chunk's voxel grid. The `FromPrimitive` derive
/// allows conversion back from those integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Light travels through it and faces next to it are visible.
    #[default]
    EMPTY = 0,

    /// The surface block produced by terrain generation. Its color is scaled by light.
    GRASS = 1,

    /// A solid block drawn with a fixed color that ignores light.
    STONE = 2,
}

impl BlockType {
    /// Converts a stored `BlockTypeSize` back to a `BlockType`.
    ///
    /// # Errors
    /// Returns [`VoxelError::UnknownBlockType`] when the value names no variant.
    pub fn from_int(btype: BlockTypeSize) -> Result<Self, VoxelError> {
        num::FromPrimitive::from_u8(btype).ok_or(VoxelError::UnknownBlockType(btype))
    }

    /// The compact representation stored in the voxel grid.
    pub fn as_int(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// `true` for every type except [`BlockType::EMPTY`].
    pub fn is_solid(self) -> bool {
        self != BlockType::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_ids_round_trip() {
        for block_type in [BlockType::EMPTY, BlockType::GRASS, BlockType::STONE] {
            assert_eq!(BlockType::from_int(block_type.as_int()), Ok(block_type));
        }
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(BlockType::from_int(200), Err(VoxelError::UnknownBlockType(200)));
    }

    #[test]
    fn only_empty_is_not_solid() {
        assert!(!BlockType::EMPTY.is_solid());
        assert!(BlockType::GRASS.is_solid());
        assert!(BlockType::STONE.is_solid());
    }
}
