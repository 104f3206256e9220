//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on the task manager's
//! workers so terrain generation never stalls a streaming pass.

pub mod chunk_generation_task;
