//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask`, which fills a chunk's voxel data from the
//! terrain sampler off the streaming thread. The streamer publishes one for every grid cell it
//! marks as loading.

use std::sync::Arc;

use crate::engine_state::{
    error::VoxelError,
    task_management::task::{Task, TaskOutcome, TaskResult},
    voxels::{
        chunk::{ChunkData, ChunkPosition},
        terrain::TerrainSampler,
        world::World,
    },
};

/// A task that generates chunk data from a terrain sampler.
///
/// Generation is pure: the task only reads the sampler and never touches the world.
pub struct ChunkGenerationTask {
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkPosition,
    /// Source of column heights, shared by every generation task
    sampler: Arc<dyn TerrainSampler>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates where the chunk should be generated
    /// * `sampler` - The terrain sampler to generate from
    pub fn new(position: ChunkPosition, sampler: Arc<dyn TerrainSampler>) -> Self {
        ChunkGenerationTask { position, sampler }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            data: ChunkData::from_terrain(self.position, self.sampler.as_ref()),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    position: ChunkPosition,
    data: Result<ChunkData, VoxelError>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Moves the chunk from loading to loaded.
    ///
    /// On success the chunk is inserted and linked to every loaded face-adjacent chunk. On
    /// failure the loading mark is cleared and the position is remembered as failed, so the
    /// streamer does not request it again. A result for a position that is no longer loading is dropped.
    fn handle_result(self: Box<Self>, world: &mut World) -> (Vec<Box<dyn Task + Send>>, TaskOutcome) {
        if !world.is_loading(self.position) {
            log::debug!("Dropping stale generation result for {:?}", self.position);
            return (Vec::new(), TaskOutcome::Discarded);
        }

        let outcome = match self.data {
            Ok(data) => {
                world.insert_chunk(self.position, data);
                TaskOutcome::Applied
            }
            Err(err) => {
                log::error!("Failed to generate chunk {:?}: {}", self.position, err);
                world.mark_generation_failed(self.position);
                TaskOutcome::Failed
            }
        };
        (Vec::new(), outcome)
    }
}
