//! # Rendering Module
//!
//! The boundary between voxel data and the graphics backend.
//!
//! ## Architecture
//! - `vertex`: the GPU-ready vertex format
//! - `meshing`: the mesh sink contract, the face-culled mesher that feeds it, and the sinks
//!   themselves (a CPU-side buffer builder and a recording test double)
//!
//! Nothing in here talks to a GPU. A backend consumes [`meshing::cpu_mesh::UploadedMesh`]
//! snapshots, or implements [`meshing::MeshSink`] directly.

pub mod meshing;
pub mod vertex;

pub use vertex::Vertex;
