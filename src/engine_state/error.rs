//! Error types for the voxel world and its configuration.

use cgmath::Point3;
use thiserror::Error;

/// Errors produced by voxel storage, lighting, terrain generation and world operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoxelError {
    /// A chunk-local coordinate outside `0..CHUNK_DIMENSION` on at least one axis.
    #[error("voxel coordinate ({x}, {y}, {z}) is outside the chunk")]
    OutOfBounds { x: i32, y: i32, z: i32 },

    /// Light levels are stored in a nibble.
    #[error("light level {0} exceeds the maximum of 15")]
    LightLevelOutOfRange(u8),

    /// A stored block id that does not name a `BlockType`.
    #[error("unknown block type id {0}")]
    UnknownBlockType(u8),

    /// The operation needs a loaded chunk at this grid position.
    #[error("no chunk loaded at {0:?}")]
    ChunkNotLoaded(Point3<i32>),

    /// The terrain sampler produced NaN or infinity.
    #[error("terrain sample at ({x}, {z}) is not finite")]
    NonFiniteTerrain { x: f64, z: f64 },
}

/// Errors produced while loading a [`WorldConfig`](super::config::WorldConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
