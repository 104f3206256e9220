//! # Task Management System
//!
//! This module provides a small worker pool for executing work off the thread that owns the
//! world, such as chunk terrain generation.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, applied to the world by its owner
//! - `TaskChannel`: Communication channel between the owner and one worker thread
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied to the world in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//!
//! ## Inline Mode
//! A manager created with zero workers runs every task inside `publish_task()` and keeps the
//! result until the next `process_completed_tasks()`. Nothing is ever processed on another
//! thread, which makes the outcome of a sequence of calls fully deterministic.
//!
//! ## Shutdown
//! Dropping the manager closes every task channel and joins the workers. Tasks still queued
//! are dropped unprocessed.

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::info;
use task::{Task, TaskOutcome, TaskResult};

use super::voxels::world::World;

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined on drop
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Tally of the results applied by one `process_completed_tasks()` call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletedTasks {
    pub applied: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl CompletedTasks {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Applied => self.applied += 1,
            TaskOutcome::Failed => self.failed += 1,
            TaskOutcome::Discarded => self.discarded += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.applied + self.failed + self.discarded
    }
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and joining worker threads
/// - Distributing tasks across available workers
/// - Queuing tasks while all workers are busy
/// - Applying results to the world
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    /// Results of tasks run inline, waiting to be applied.
    inline_results: VecDeque<Box<dyn TaskResult + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 to ensure tasks are processed in order within each channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create, `0` for inline processing
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> std::io::Result<Self> {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("task-worker-{index}"))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        if num_workers > 0 {
            info!(
                "Started {} task workers (available parallelism: {:?})",
                num_workers,
                thread::available_parallelism()
            );
        } else {
            info!("Task manager running inline");
        }

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            inline_results: VecDeque::new(),
            current_channel: 0,
        })
    }

    pub fn is_inline(&self) -> bool {
        self.channels.is_empty()
    }

    /// Tasks waiting for a free worker.
    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks handed to workers whose results have not been applied yet.
    pub fn in_flight_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum::<usize>()
            + self.inline_results.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the in-flight counter is incremented
    /// - `Err(task)` if the worker has disconnected, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last used one.
    ///
    /// # Returns
    /// - `Some(usize)` index of a channel below `MAX_TASKS_IN_FLIGHT`
    /// - `None` if all channels are busy or there are no channels
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// In inline mode the task runs immediately and its result waits for
    /// `process_completed_tasks()`.
    ///
    /// # Returns
    /// - `true` if the task was processed inline or handed to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        if self.is_inline() {
            self.inline_results.push_back(task.process());
            return true;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    log::warn!("Task worker {} disconnected", channel_idx);
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers until the queue is empty or all workers are busy.
    ///
    /// Tasks are dispatched oldest first.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Applies every result that is ready to the world.
    ///
    /// Follow-up tasks returned by results are published after all ready results are applied.
    pub fn process_completed_tasks(&mut self, world: &mut World) -> CompletedTasks {
        let mut completed = CompletedTasks::default();
        let mut tasks_to_queue = Vec::new();

        while let Some(result) = self.inline_results.pop_front() {
            let (new_tasks, outcome) = result.handle_result(world);
            completed.record(outcome);
            tasks_to_queue.extend(new_tasks);
        }

        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                let (new_tasks, outcome) = result.handle_result(world);
                completed.record(outcome);
                tasks_to_queue.extend(new_tasks);
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        completed
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        let dropped = self.queued_tasks.len();
        self.queued_tasks.clear();
        for channel in self.channels.drain(..) {
            drop(channel.task_sender);
            if channel.worker.join().is_err() {
                log::error!("A task worker panicked");
            }
        }
        if dropped > 0 {
            info!("Dropped {} queued tasks on shutdown", dropped);
        }
    }
}
