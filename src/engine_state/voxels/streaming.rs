//! # Chunk Streaming Module
//!
//! Keeps the chunks within draw distance of the viewer loaded and linked.
//!
//! ## The Pass
//!
//! A streaming pass visits every loaded chunk once:
//! 1. A chunk with all six sides linked is skipped.
//! 2. A chunk whose center lies beyond the draw distance is evicted.
//! 3. Otherwise, for each unlinked side whose adjacent cell center is within draw distance:
//!    - a loaded chunk there is linked,
//!    - a cell already being generated is left alone,
//!    - a cell with cached data is restored from the eviction cache,
//!    - anything else is marked loading and a generation task is published.
//!
//! Generation results are applied at the start and the end of each pass. A generated chunk
//! links itself to every loaded neighbor when it is inserted, so the graph grows outwards from
//! the seed chunk one ring per pass. If nothing is loaded at all, the pass requests the cell
//! containing the viewer, provided its center is within draw distance. A cell whose generation
//! failed is never requested again.
//!
//! ## Threading
//!
//! [`ChunkStreamer::pass`] needs exclusive access to the world for its whole duration.
//! [`StreamingThread`] runs passes at a fixed interval, taking the world's write guard once per
//! pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cgmath::{MetricSpace, Point3};
use web_time::{Duration, Instant};

use super::block::block_side::BlockSide;
use super::chunk::{chunk_center, chunk_containing, ChunkPosition};
use super::tasks::chunk_generation_task::ChunkGenerationTask;
use super::terrain::TerrainSampler;
use super::world::World;
use crate::core::MtResource;
use crate::engine_state::task_management::{CompletedTasks, TaskManager};
use crate::engine_state::viewer::ViewerPositionProvider;

/// Log target for everything the streaming thread reports.
pub const STREAMING_LOG_TARGET: &str = "voxel_world::streaming";

/// What one streaming pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunks removed for being out of range
    pub evicted: usize,
    /// Links made between two already loaded chunks
    pub linked: usize,
    /// Generation tasks published
    pub requested: usize,
    /// Chunks restored from the eviction cache
    pub restored: usize,
    /// Generated chunks inserted
    pub generated: usize,
    /// Generation tasks that failed
    pub failed: usize,
}

impl StreamingReport {
    fn add_completed(&mut self, completed: CompletedTasks) {
        self.generated += completed.applied;
        self.failed += completed.failed;
    }

    /// `true` if the pass changed nothing.
    pub fn is_idle(&self) -> bool {
        *self == StreamingReport::default()
    }
}

/// Decides which chunks to load, link and evict around the viewer.
pub struct ChunkStreamer {
    draw_distance: f64,
    sampler: Arc<dyn TerrainSampler>,
    task_manager: TaskManager,
}

impl ChunkStreamer {
    /// # Arguments
    /// * `draw_distance` - Maximum viewer to chunk center distance, in world units
    /// * `sampler` - Terrain source for newly generated chunks
    /// * `task_manager` - Where generation tasks run
    pub fn new(
        draw_distance: f64,
        sampler: Arc<dyn TerrainSampler>,
        task_manager: TaskManager,
    ) -> Self {
        ChunkStreamer {
            draw_distance,
            sampler,
            task_manager,
        }
    }

    pub fn draw_distance(&self) -> f64 {
        self.draw_distance
    }

    /// Whether a cell's center is within draw distance of `viewer`.
    pub fn in_range(&self, position: ChunkPosition, viewer: Point3<f64>) -> bool {
        chunk_center(position).distance(viewer) <= self.draw_distance
    }

    /// Generation tasks published but not yet applied.
    pub fn pending_generation(&self) -> usize {
        self.task_manager.in_flight_count() + self.task_manager.queued_count()
    }

    /// Runs one streaming pass over `world` for a viewer at `viewer`.
    pub fn pass(&mut self, world: &mut World, viewer: Point3<f64>) -> StreamingReport {
        let mut report = StreamingReport::default();
        report.add_completed(self.task_manager.process_completed_tasks(world));

        let viewer_cell = chunk_containing(viewer);
        if world.is_empty() && world.loading_count() == 0 && self.in_range(viewer_cell, viewer) {
            self.request(world, viewer_cell, &mut report);
        }

        for position in world.positions() {
            let missing: Vec<BlockSide> = match world.get_chunk_at(position) {
                Some(chunk) if !chunk.is_surrounded() => chunk.missing_sides().collect(),
                _ => continue,
            };

            if !self.in_range(position, viewer) {
                world.evict(position);
                report.evicted += 1;
                continue;
            }

            for side in missing {
                let adjacent = position + side.offset();
                if !self.in_range(adjacent, viewer) {
                    continue;
                }
                if world.contains(adjacent) {
                    if world.link(position, side) {
                        report.linked += 1;
                    }
                } else {
                    self.request(world, adjacent, &mut report);
                }
            }
        }

        self.task_manager.process_queued_tasks();
        report.add_completed(self.task_manager.process_completed_tasks(world));
        report
    }

    /// Starts loading an unloaded cell, from the eviction cache if possible.
    fn request(&mut self, world: &mut World, position: ChunkPosition, report: &mut StreamingReport) {
        if world.contains(position) || world.is_loading(position) || world.has_failed(position) {
            return;
        }
        if let Some(data) = world.take_cached(position) {
            world.insert_chunk(position, data);
            report.restored += 1;
            return;
        }
        world.mark_loading(position);
        self.task_manager.publish_task(Box::new(ChunkGenerationTask::new(
            position,
            self.sampler.clone(),
        )));
        report.requested += 1;
    }
}

/// Runs streaming passes on a dedicated thread until stopped or dropped.
pub struct StreamingThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StreamingThread {
    /// Spawns the streaming thread.
    ///
    /// # Arguments
    /// * `streamer` - The streamer to run; it moves to the new thread
    /// * `world` - The shared registry, write-locked for each pass
    /// * `viewer` - Queried once at the start of each pass
    /// * `interval` - Time between the starts of two passes
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start(
        mut streamer: ChunkStreamer,
        world: MtResource<World>,
        viewer: Arc<dyn ViewerPositionProvider>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("chunk-streaming".to_string())
            .spawn(move || {
                log::info!(target: STREAMING_LOG_TARGET, "Streaming every {:?}", interval);
                while !thread_stop.load(Ordering::Acquire) {
                    let started = Instant::now();
                    let position = viewer.viewer_position();
                    let (report, loaded) = {
                        let mut world = world.get_mut();
                        let report = streamer.pass(&mut world, position);
                        (report, world.len())
                    };
                    if !report.is_idle() {
                        log::debug!(
                            target: STREAMING_LOG_TARGET,
                            "Pass at {:?}: {:?}, {} chunks loaded",
                            position,
                            report,
                            loaded
                        );
                    }
                    if report.failed > 0 {
                        log::warn!(
                            target: STREAMING_LOG_TARGET,
                            "{} chunk generations failed",
                            report.failed
                        );
                    }

                    if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                        thread::sleep(remaining);
                    }
                }
                log::info!(target: STREAMING_LOG_TARGET, "Streaming stopped");
            })?;

        Ok(StreamingThread {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the thread to stop and waits for the current pass to end.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!(target: STREAMING_LOG_TARGET, "Streaming thread panicked");
            }
        }
    }
}

impl Drop for StreamingThread {
    fn drop(&mut self) {
        self.stop();
    }
}
