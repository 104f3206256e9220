#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked voxel world core: dense per-chunk block and light storage, a face-culled mesher,
//! torchlight flood fill, fractal terrain, and a streamer that keeps the chunks around a viewer
//! loaded and linked.
//!
//! ## Key Modules
//!
//! * `core` - Shared-resource primitives used throughout the crate
//! * `engine_state` - The engine context and every voxel, meshing and scheduling subsystem
//!
//! ## Architecture
//!
//! The crate stops at the mesh sink. A graphics backend implements
//! [`MeshSink`](engine_state::rendering::meshing::MeshSink) or consumes the snapshots of the
//! bundled CPU mesh. Window, input and camera handling stay with the embedding application,
//! which only reports a viewer position.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     if let Err(err) = voxel_world::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use std::error::Error;
use std::sync::Arc;
use std::thread;

use cgmath::{Point3, Vector3};
use log::{debug, info};
use web_time::{Duration, Instant};

use engine_state::{
    config::WorldConfig,
    error::VoxelError,
    rendering::meshing::cpu_mesh::CpuMeshFactory,
    viewer::ViewerPositionProvider,
    voxels::{block::block_type::BlockType, chunk::storage::MAX_LIGHT_LEVEL},
    EngineState,
};

pub mod core;
pub mod engine_state;

/// Frames the headless demo runs for.
const DEMO_FRAMES: u32 = 600;
/// Target frame length of the demo loop.
const DEMO_FRAME_TIME: Duration = Duration::from_millis(16);
/// Viewer speed along +x, in voxels per second.
const DEMO_VIEWER_SPEED: f64 = 24.0;
/// A torch is placed every this many frames.
const DEMO_TORCH_INTERVAL: u32 = 30;
/// Torches land within this many voxels of the viewer on each axis.
const DEMO_TORCH_RADIUS: i32 = 12;
const DEMO_SEED: u64 = 0x5eed;

/// Runs the headless demo.
///
/// The first command line argument, if present, is the path to a JSON [`WorldConfig`].
/// The demo streams terrain around a viewer moving along +x, drops torches at random empty
/// voxels near it, and logs mesh statistics before shutting down.
///
/// # Errors
/// Fails if the configuration cannot be loaded or a thread cannot be spawned.
pub fn run() -> Result<(), Box<dyn Error>> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };

    let factory = Arc::new(CpuMeshFactory::new());
    let mut engine = EngineState::new(config, factory.clone());
    engine.start_streaming()?;

    let mut rng = fastrand::Rng::with_seed(DEMO_SEED);
    let mut torches = 0;
    let mut last_frame = Instant::now();

    for frame in 0..DEMO_FRAMES {
        let frame_start = Instant::now();
        let elapsed = frame_start - last_frame;
        last_frame = frame_start;

        engine.viewer.translate(Vector3::new(
            DEMO_VIEWER_SPEED * elapsed.as_secs_f64(),
            0.0,
            0.0,
        ));
        if frame % DEMO_TORCH_INTERVAL == 0 && place_random_torch(&engine, &mut rng)? {
            torches += 1;
        }
        engine.advance(elapsed);

        if let Some(remaining) = DEMO_FRAME_TIME.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    let (loaded, loading) = {
        let world = engine.world.get();
        (world.len(), world.loading_count())
    };
    let totals = factory.totals();
    info!(
        "Viewer at {:?}: {} chunks loaded, {} loading, {} torches placed",
        engine.viewer.viewer_position(),
        loaded,
        loading,
        torches
    );
    info!(
        "Meshes: {} live, {} builds, {} triangles, {} vertices",
        totals.live_meshes, totals.builds, totals.triangles, totals.vertices
    );

    engine.shutdown();
    Ok(())
}

/// Places a full-strength torch at a random voxel near the viewer if that voxel is empty.
///
/// # Returns
/// `Ok(false)` when the voxel is solid or its chunk is not loaded yet.
fn place_random_torch(engine: &EngineState, rng: &mut fastrand::Rng) -> Result<bool, VoxelError> {
    let viewer = engine.viewer.viewer_position();
    let offset = Vector3::new(
        rng.i32(-DEMO_TORCH_RADIUS..=DEMO_TORCH_RADIUS),
        rng.i32(-DEMO_TORCH_RADIUS..=DEMO_TORCH_RADIUS),
        rng.i32(-DEMO_TORCH_RADIUS..=DEMO_TORCH_RADIUS),
    );
    let target = Point3::new(
        viewer.x.floor() as i32,
        viewer.y.floor() as i32,
        viewer.z.floor() as i32,
    ) + offset;

    let mut world = engine.world.get_mut();
    match world.block_at(target) {
        Ok(BlockType::EMPTY) => {
            let lit = world.place_light(target, MAX_LIGHT_LEVEL)?;
            debug!("Torch at {:?} lit {} voxels", target, lit);
            Ok(true)
        }
        Ok(_) | Err(VoxelError::ChunkNotLoaded(_)) => Ok(false),
        Err(err) => Err(err),
    }
}
