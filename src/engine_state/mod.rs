//! # Engine State Module
//!
//! The context object that ties the voxel world to its two schedules: the fixed-rate simulation
//! step, which owns mesh sinks, and the streaming thread, which loads and evicts chunks.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container, constructed once and passed around explicitly
//! * `config` - `WorldConfig`, loaded from JSON
//! * `error` - Error types shared by every subsystem
//! * `rendering` - Mesh sinks and the face-culled mesher
//! * `simulation` - Fixed-step simulation clock
//! * `task_management` - Worker pool for terrain generation
//! * `viewer` - Viewer position providers
//! * `voxels` - Voxel data, chunks, lighting, terrain and streaming
//!
//! ## Synchronization
//!
//! The world lives in an `MtResource<World>`. The streaming thread holds the write guard for
//! each whole pass, and `simulate()` holds it for each whole mesh sweep, so the two schedules
//! never interleave registry mutations.

use std::sync::Arc;

use cgmath::Point3;
use log::info;
use web_time::Duration;

use config::WorldConfig;
use error::VoxelError;
use rendering::meshing::MeshFactory;
use simulation::{FixedStepSimulation, StepPlan};
use task_management::TaskManager;
use viewer::TrackedViewer;
use voxels::{
    block::block_type::BlockType,
    streaming::{ChunkStreamer, StreamingThread},
    terrain::{FractalTerrain, TerrainSampler},
    world::{MeshRebuildReport, World},
};

use crate::core::MtResource;

pub mod config;
pub mod error;
pub mod rendering;
pub mod simulation;
pub mod task_management;
pub mod viewer;
pub mod voxels;

/// The main state container for the voxel world.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use voxel_world::engine_state::{
///     config::WorldConfig, rendering::meshing::cpu_mesh::CpuMeshFactory, EngineState,
/// };
/// use web_time::Duration;
///
/// let factory = Arc::new(CpuMeshFactory::new());
/// let mut engine = EngineState::new(WorldConfig::default(), factory);
/// engine.start_streaming().unwrap();
///
/// // Main loop
/// for _ in 0..3 {
///     engine.advance(Duration::from_millis(50));
/// }
/// engine.shutdown();
/// ```
pub struct EngineState {
    /// Configuration the engine was built from
    pub config: WorldConfig,
    /// The voxel world containing all chunk data
    pub world: MtResource<World>,
    /// Position the world is streamed around
    pub viewer: TrackedViewer,
    /// Source of a fresh sink for every mesh build
    mesh_factory: Arc<dyn MeshFactory>,
    /// Running streaming thread, if started
    streaming: Option<StreamingThread>,
    simulation: FixedStepSimulation,
}

impl EngineState {
    /// Creates the engine context. Streaming does not start until `start_streaming()`.
    ///
    /// # Arguments
    /// * `config` - A validated world configuration
    /// * `mesh_factory` - Creates the mesh sink for every chunk build
    pub fn new(config: WorldConfig, mesh_factory: Arc<dyn MeshFactory>) -> Self {
        let world = MtResource::new(World::with_config(&config));
        let viewer = TrackedViewer::new(config.viewer_start());
        let simulation = FixedStepSimulation::new(config.simulation_hz);

        EngineState {
            config,
            world,
            viewer,
            mesh_factory,
            streaming: None,
            simulation,
        }
    }

    /// Starts streaming chunks generated by the fractal terrain seeded from the configuration.
    ///
    /// # Errors
    /// Returns the OS error if a worker or the streaming thread cannot be spawned.
    pub fn start_streaming(&mut self) -> std::io::Result<()> {
        self.start_streaming_with(Arc::new(FractalTerrain::new(self.config.seed)))
    }

    /// Starts streaming chunks generated by `sampler`. A running streaming thread is stopped first.
    pub fn start_streaming_with(&mut self, sampler: Arc<dyn TerrainSampler>) -> std::io::Result<()> {
        self.stop_streaming();

        let task_manager = TaskManager::new(self.config.worker_threads)?;
        let streamer = ChunkStreamer::new(self.config.draw_distance(), sampler, task_manager);
        self.streaming = Some(StreamingThread::start(
            streamer,
            self.world.clone(),
            Arc::new(self.viewer.clone()),
            self.config.streaming_interval(),
        )?);
        info!(
            "Streaming started: draw distance {}, {} workers",
            self.config.draw_distance(),
            self.config.worker_threads
        );
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.as_ref().is_some_and(StreamingThread::is_running)
    }

    /// Stops the streaming thread and waits for its current pass to end.
    pub fn stop_streaming(&mut self) {
        if let Some(mut streaming) = self.streaming.take() {
            streaming.stop();
        }
    }

    /// Runs one simulation step: retired meshes are torn down and dirty meshes rebuilt.
    pub fn simulate(&mut self) -> MeshRebuildReport {
        self.world.get_mut().rebuild_dirty_meshes(self.mesh_factory.as_ref())
    }

    /// Feeds one frame's elapsed time into the simulation clock and runs the steps it asks for.
    pub fn advance(&mut self, elapsed: Duration) -> StepPlan {
        let plan = self.simulation.advance(elapsed);
        for _ in 0..plan.steps {
            let report = self.simulate();
            if report.rebuilt > 0 {
                log::debug!(
                    "Rebuilt {} meshes ({} quads), tore down {}",
                    report.rebuilt,
                    report.stats.quads,
                    report.torn_down
                );
            }
        }
        if let Some(second) = plan.second_elapsed {
            info!("{} frames, {} simulation steps", second.frames, second.steps);
        }
        plan
    }

    /// Places a torchlight source at an integer world voxel.
    pub fn place_light(&self, world_voxel: Point3<i32>, intensity: u8) -> Result<usize, VoxelError> {
        self.world.get_mut().place_light(world_voxel, intensity)
    }

    /// Replaces the block at an integer world voxel.
    pub fn set_block(&self, world_voxel: Point3<i32>, block_type: BlockType) -> Result<(), VoxelError> {
        self.world.get_mut().set_block(world_voxel, block_type)
    }

    /// Stops streaming and tears down every mesh.
    ///
    /// # Returns
    /// The number of meshes torn down.
    pub fn shutdown(mut self) -> usize {
        self.stop_streaming();
        let torn_down = self.world.get_mut().tear_down_all_meshes();
        info!("Engine shut down, {} meshes torn down", torn_down);
        torn_down
    }
}

impl Drop for EngineState {
    fn drop(&mut self) {
        self.stop_streaming();
    }
}
