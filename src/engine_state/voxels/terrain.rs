//! # Terrain Module
//!
//! Height-field terrain for chunk generation.
//!
//! ## Architecture
//!
//! Generation is split in two:
//! - A [`TerrainSampler`] maps a world `(x, z)` column to a surface height. It must be pure: the
//!   same sampler called twice with the same arguments returns the same bits, on any thread.
//! - [`ChunkData::from_terrain`] fills a chunk's voxel grid from the sampler, one column at a
//!   time: every voxel whose world `y` lies below the column height becomes grass.
//!
//! ## Fractal Noise
//!
//! [`FractalTerrain`] layers OpenSimplex noise:
//! - [`OctaveNoise`] sums `n` layers, doubling the amplitude and halving the frequency each octave.
//! - [`CombinedNoise`] domain-warps one octave stack by another: `a(x + b(x, y), y)`.
//!
//! Two combined stacks give a low and a high surface; a six-octave gate picks where the high
//! surface may poke through.

use noise::{NoiseFn, OpenSimplex};

use super::chunk::{storage::voxel_index_unchecked, ChunkData, ChunkPosition, CHUNK_DIMENSION};
use crate::engine_state::error::VoxelError;
use crate::engine_state::voxels::block::block_type::BlockType;

/// Surface heights are clamped to `-TERRAIN_HEIGHT_LIMIT..=TERRAIN_HEIGHT_LIMIT`.
pub const TERRAIN_HEIGHT_LIMIT: f64 = 1024.0;

/// Input scale applied to world coordinates before sampling the surface stacks.
const SURFACE_SCALE: f64 = 1.3;

/// Deterministic source of terrain surface heights.
pub trait TerrainSampler: Send + Sync {
    /// Surface height of the world column at `(x, z)`.
    fn sample(&self, x: f64, z: f64) -> f64;
}

/// Sum of OpenSimplex layers with doubling amplitude and halving frequency.
pub struct OctaveNoise {
    layers: Vec<OpenSimplex>,
}

impl OctaveNoise {
    /// Creates `octaves` layers, all seeded with `seed`.
    pub fn new(octaves: usize, seed: u32) -> Self {
        OctaveNoise {
            layers: (0..octaves).map(|_| OpenSimplex::new(seed)).collect(),
        }
    }
}

impl NoiseFn<f64, 2> for OctaveNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut sum = 0.0;
        for layer in &self.layers {
            sum += layer.get([point[0] * frequency, point[1] * frequency]) * amplitude;
            amplitude *= 2.0;
            frequency *= 0.5;
        }
        sum
    }
}

/// `base` sampled with its x input offset by `warp`.
pub struct CombinedNoise {
    base: OctaveNoise,
    warp: OctaveNoise,
}

impl CombinedNoise {
    pub fn new(base: OctaveNoise, warp: OctaveNoise) -> Self {
        CombinedNoise { base, warp }
    }
}

impl NoiseFn<f64, 2> for CombinedNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        let offset = self.warp.get(point);
        self.base.get([point[0] + offset, point[1]])
    }
}

/// Rolling terrain with occasional raised plateaus.
pub struct FractalTerrain {
    low: CombinedNoise,
    high: CombinedNoise,
    gate: OctaveNoise,
}

impl FractalTerrain {
    pub fn new(seed: u32) -> Self {
        let stack = |octaves| OctaveNoise::new(octaves, seed);
        FractalTerrain {
            low: CombinedNoise::new(stack(8), stack(8)),
            high: CombinedNoise::new(stack(8), stack(8)),
            gate: stack(6),
        }
    }
}

impl TerrainSampler for FractalTerrain {
    fn sample(&self, x: f64, z: f64) -> f64 {
        let surface = [x * SURFACE_SCALE, z * SURFACE_SCALE];
        let mut height = self.low.get(surface) / 6.0 - 4.0;

        // The gate is sampled in chunk-local column coordinates, so its pattern repeats per chunk.
        let dimension = CHUNK_DIMENSION as f64;
        if self.gate.get([x.rem_euclid(dimension), z.rem_euclid(dimension)]) <= 0.0 {
            height = height.max(self.high.get(surface) / 5.0 + 6.0);
        }

        height *= 0.5;
        if height < 0.0 {
            height *= 0.8;
        }
        height.clamp(-TERRAIN_HEIGHT_LIMIT, TERRAIN_HEIGHT_LIMIT)
    }
}

/// A level plane at a fixed height.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlatTerrain {
    pub height: f64,
}

impl FlatTerrain {
    pub fn new(height: f64) -> Self {
        FlatTerrain { height }
    }
}

impl TerrainSampler for FlatTerrain {
    fn sample(&self, _x: f64, _z: f64) -> f64 {
        self.height
    }
}

impl ChunkData {
    /// Generates the voxel data of the chunk at `position`.
    ///
    /// Light starts fully dark; only block types come from the sampler.
    ///
    /// # Arguments
    /// * `position` - The grid position of the chunk being generated
    /// * `sampler` - Source of column heights
    ///
    /// # Errors
    /// Returns [`VoxelError::NonFiniteTerrain`] if the sampler yields NaN or an infinity for
    /// any column of the chunk.
    pub fn from_terrain(
        position: ChunkPosition,
        sampler: &dyn TerrainSampler,
    ) -> Result<Self, VoxelError> {
        let mut data = ChunkData::default();
        let dimension = CHUNK_DIMENSION as usize;
        let base_x = position.x * CHUNK_DIMENSION;
        let base_y = position.y * CHUNK_DIMENSION;
        let base_z = position.z * CHUNK_DIMENSION;

        for z in 0..dimension {
            let world_z = (base_z + z as i32) as f64;
            for x in 0..dimension {
                let world_x = (base_x + x as i32) as f64;
                let height = sampler.sample(world_x, world_z);
                if !height.is_finite() {
                    return Err(VoxelError::NonFiniteTerrain {
                        x: world_x,
                        z: world_z,
                    });
                }

                for y in 0..dimension {
                    if ((base_y + y as i32) as f64) < height {
                        data.blocks
                            .set_at(voxel_index_unchecked(x, y, z), BlockType::GRASS);
                    }
                }
            }
        }

        Ok(data)
    }
}
