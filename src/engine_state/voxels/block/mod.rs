//! # Block Module
//!
//! Block type definitions, block faces, and the per-type base colors used by the mesher.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// How a block type's face color reacts to light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BlockTint {
    /// The base color is multiplied by the face's light factor.
    Lit([f32; 3]),
    /// The color is used as-is.
    Flat([f32; 3]),
    /// Never drawn.
    Invisible,
}

/// Maps each block type (indexed by its stored id) to its tint.
pub static BLOCK_TYPE_TO_TINT: [BlockTint; 3] = [
    BlockTint::Invisible,                    // EMPTY
    BlockTint::Lit([0.094, 0.568, 0.109]),   // GRASS
    BlockTint::Flat([0.423, 0.478, 0.537]),  // STONE
];

impl BlockType {
    /// Looks up the tint for this block type.
    pub fn tint(self) -> BlockTint {
        BLOCK_TYPE_TO_TINT[self as usize]
    }
}
