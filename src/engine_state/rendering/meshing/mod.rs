//! Mesh generation and the mesh sink contract.
//!
//! This module handles the conversion of chunk voxel data into triangle meshes. The mesher
//! never builds GPU buffers itself; it streams geometry into a [`MeshSink`] supplied by the
//! graphics context.
//!
//! # Architecture
//! - [`MeshSink`]: receives colors, vertices and triangles for one chunk mesh
//! - [`MeshFactory`]: hands out a fresh sink for every build
//! - `culled`: the face-culled mesher
//! - `cpu_mesh`: a sink that accumulates `Vertex`/index buffers for upload
//! - `recording`: a sink that records every call, for tests
//!
//! # Sink Contract
//! For each emitted face the mesher calls, in order:
//!
//! ```text
//! set_color(c)
//! add_vertex(p0) -> i0, add_vertex(p1) -> i1, add_vertex(p2) -> i2, add_vertex(p3) -> i3
//! add_triangle(i0, i1, i2)
//! add_triangle(i0, i2, i3)
//! ```
//!
//! After the last face the owner calls `finish()` once. A sink is torn down exactly once with
//! `tear_down()` and is never used again afterwards.

use cgmath::Point3;

use crate::engine_state::voxels::chunk::ChunkPosition;

pub mod cpu_mesh;
pub mod culled;
mod face;
pub mod recording;

pub use culled::{CulledMesher, MeshStats};

/// Receives the geometry of one chunk mesh.
pub trait MeshSink: Send + Sync {
    /// Color applied to the vertices added after this call.
    fn set_color(&mut self, color: [f32; 3]);

    /// Appends a vertex and returns its index within this mesh.
    fn add_vertex(&mut self, position: Point3<f32>) -> u32;

    /// Appends a triangle over three previously returned vertex indices.
    fn add_triangle(&mut self, i1: u32, i2: u32, i3: u32);

    /// Marks the geometry as complete and ready for upload.
    fn finish(&mut self);

    /// Releases whatever the mesh holds.
    fn tear_down(&mut self);
}

/// Creates mesh sinks on behalf of the graphics context.
pub trait MeshFactory: Send + Sync {
    /// A fresh, empty sink for the chunk at `position`.
    fn create_mesh(&self, position: ChunkPosition) -> Box<dyn MeshSink>;
}
