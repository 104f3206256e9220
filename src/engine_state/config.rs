//! # World Configuration
//!
//! Runtime settings for the voxel world, loaded from JSON. Every field has a default, so an
//! empty object (`{}`) is a valid configuration.
//!
//! ```json
//! {
//!     "seed": 420,
//!     "draw_distance_chunks": 4.0,
//!     "simulation_hz": 20,
//!     "streaming_interval_ms": 100,
//!     "worker_threads": 4,
//!     "cross_chunk_lighting": true,
//!     "evicted_chunk_cache": 256,
//!     "viewer_start": [0.0, 0.0, 0.0]
//! }
//! ```

use std::path::Path;

use cgmath::Point3;
use serde::Deserialize;
use web_time::Duration;

use super::error::ConfigError;
use super::voxels::chunk::CHUNK_DIMENSION;

/// Settings consumed by [`EngineState`](super::EngineState) and the subsystems it builds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Seed shared by every noise layer of the terrain sampler.
    pub seed: u32,
    /// Draw distance expressed in chunk widths.
    pub draw_distance_chunks: f64,
    /// Fixed simulation rate in steps per second.
    pub simulation_hz: u32,
    /// Interval between two streaming passes.
    pub streaming_interval_ms: u64,
    /// Terrain generation workers. `0` runs generation inline on the streaming context.
    pub worker_threads: usize,
    /// Whether torchlight crosses into linked neighbor chunks.
    pub cross_chunk_lighting: bool,
    /// Number of evicted chunks whose voxel data is kept for fast reloads. `0` disables the cache.
    pub evicted_chunk_cache: usize,
    /// Initial viewer position in world units.
    pub viewer_start: [f64; 3],
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 420,
            draw_distance_chunks: 4.0,
            simulation_hz: 20,
            streaming_interval_ms: 100,
            worker_threads: 4,
            cross_chunk_lighting: true,
            evicted_chunk_cache: 256,
            viewer_start: [0.0, 0.0, 0.0],
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&contents)?;
        log::info!("Loaded world config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Checks the values serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.draw_distance_chunks.is_finite() || self.draw_distance_chunks <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "draw_distance_chunks",
                reason: format!("must be a positive number, got {}", self.draw_distance_chunks),
            });
        }
        if self.simulation_hz == 0 {
            return Err(ConfigError::Invalid {
                field: "simulation_hz",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.streaming_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "streaming_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.viewer_start.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "viewer_start",
                reason: "coordinates must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Draw distance in world units (one voxel is one unit).
    pub fn draw_distance(&self) -> f64 {
        self.draw_distance_chunks * CHUNK_DIMENSION as f64
    }

    pub fn streaming_interval(&self) -> Duration {
        Duration::from_millis(self.streaming_interval_ms)
    }

    pub fn viewer_start(&self) -> Point3<f64> {
        Point3::new(self.viewer_start[0], self.viewer_start[1], self.viewer_start[2])
    }
}
