//! Vertex data structures for voxel meshes.
//!
//! This module defines the vertex format produced by the CPU mesh sink and handed to whatever
//! graphics backend uploads it.

use cgmath::Point3;

/// A vertex of a chunk mesh.
///
/// Plain old data, so a slice of vertices can be viewed as bytes for upload.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Color: 3x f32 (12 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Linear RGB color of the face this vertex belongs to
    pub color: [f32; 3],
}

impl Vertex {
    /// Size in bytes of one vertex in a vertex buffer.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    /// Byte offset of the color attribute within a vertex.
    pub const COLOR_OFFSET: usize = std::mem::size_of::<[f32; 3]>();

    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - World-space position
    /// * `color` - RGB color of the face
    pub fn new(position: Point3<f32>, color: [f32; 3]) -> Self {
        Vertex {
            position: position.into(),
            color,
        }
    }
}
