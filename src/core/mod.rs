//! # Core Module
//!
//! Concurrency primitives shared by the rest of the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking. The chunk
//!   registry and the tracked viewer position are shared through it.

pub mod mt_resource;

pub use mt_resource::MtResource;
