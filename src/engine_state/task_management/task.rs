//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work on background threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called by the owner of the world
//! 5. The result can spawn new tasks and reports how it was applied
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the owning thread
//! - Tasks never touch the world; only results do, while the caller holds it exclusively

use crate::engine_state::voxels::world::World;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks should own all the data they need to perform their work.
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// Runs on a worker thread, or inline when the manager has no workers. Errors are carried
    /// inside the returned result rather than raised here.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// How a task result affected the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The result was applied.
    Applied,
    /// The work failed; the world was left consistent without it.
    Failed,
    /// The result no longer applied (for example its target was already handled) and was dropped.
    Discarded,
}

/// A trait representing the result of processing a `Task`.
pub trait TaskResult: Send {
    /// Applies the result to the world.
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty) and the outcome.
    fn handle_result(self: Box<Self>, world: &mut World) -> (Vec<Box<dyn Task + Send>>, TaskOutcome);
}
