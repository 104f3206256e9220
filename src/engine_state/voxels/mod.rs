//! # Voxel World
//!
//! Voxel storage, the chunk registry, and the systems that fill and light it.
//!
//! ## Architecture
//!
//! * **Block**: Block types, their tints, and the six face directions
//! * **Chunk**: Fixed 32³ voxel and light grids plus neighbor links
//! * **World**: The chunk registry, keyed by grid coordinate, which owns every chunk
//! * **Lighting**: Breadth-first torchlight flood fill
//! * **Terrain**: Deterministic fractal height samplers
//! * **Streaming**: Loads, links and evicts chunks around the viewer
//! * **Tasks**: Terrain generation off the streaming thread
//!
//! ## Data Flow
//!
//! 1. The streamer finds a cell within draw distance that has no chunk and marks it loading
//! 2. A generation task fills the chunk's voxel grid from the terrain sampler
//! 3. The result is inserted into the world and linked to every loaded neighbor
//! 4. Inserting, linking and editing mark meshes dirty; the simulation step rebuilds them
//!
//! ## Thread Safety
//!
//! The world itself is not synchronized. It is shared as an `MtResource<World>` and every
//! read/modify/write sequence holds the write guard for its whole duration.

pub mod block;
pub mod chunk;
pub mod lighting;
pub mod streaming;
pub mod tasks;
pub mod terrain;
pub mod world;
