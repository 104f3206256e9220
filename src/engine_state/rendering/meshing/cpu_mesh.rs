//! CPU-side mesh buffers.
//!
//! [`CpuMesh`] accumulates vertices and indices while a build streams into it. `finish()` moves
//! the geometry into an [`UploadedMesh`] snapshot that a graphics backend can copy straight into
//! vertex and index buffers.
//!
//! # Lifecycle
//! `Building` → `finish()` → `Finished` → `tear_down()` → `TornDown`. Calls that do not fit the
//! current state are ignored and logged at `warn`.

use cgmath::Point3;

use super::{MeshFactory, MeshSink};
use crate::core::MtResource;
use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::chunk::ChunkPosition;

/// Running totals across every mesh a [`CpuMeshFactory`] handed out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshTotals {
    /// Meshes finished and not yet torn down
    pub live_meshes: usize,
    /// Triangles held by live meshes
    pub triangles: usize,
    /// Vertices held by live meshes
    pub vertices: usize,
    /// Meshes finished since startup
    pub builds: usize,
}

/// Geometry published by `finish()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl UploadedMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CpuMeshState {
    Building,
    Finished,
    TornDown,
}

/// Mesh sink that builds `Vertex`/`u32` buffers in memory.
pub struct CpuMesh {
    position: ChunkPosition,
    color: [f32; 3],
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    uploaded: Option<UploadedMesh>,
    state: CpuMeshState,
    totals: Option<MtResource<MeshTotals>>,
}

impl CpuMesh {
    pub fn new(position: ChunkPosition) -> Self {
        CpuMesh {
            position,
            color: [1.0, 1.0, 1.0],
            vertices: Vec::new(),
            indices: Vec::new(),
            uploaded: None,
            state: CpuMeshState::Building,
            totals: None,
        }
    }

    fn with_totals(position: ChunkPosition, totals: MtResource<MeshTotals>) -> Self {
        CpuMesh {
            totals: Some(totals),
            ..Self::new(position)
        }
    }

    pub fn state(&self) -> CpuMeshState {
        self.state
    }

    /// The finished geometry, once `finish()` has run.
    pub fn uploaded(&self) -> Option<&UploadedMesh> {
        self.uploaded.as_ref()
    }

    fn accepts_geometry(&self, call: &str) -> bool {
        if self.state != CpuMeshState::Building {
            log::warn!(
                "Ignoring {} on mesh of chunk {:?} in state {:?}",
                call,
                self.position,
                self.state
            );
            return false;
        }
        true
    }
}

impl MeshSink for CpuMesh {
    fn set_color(&mut self, color: [f32; 3]) {
        if self.accepts_geometry("set_color") {
            self.color = color;
        }
    }

    fn add_vertex(&mut self, position: Point3<f32>) -> u32 {
        if !self.accepts_geometry("add_vertex") {
            return 0;
        }
        self.vertices.push(Vertex::new(position, self.color));
        (self.vertices.len() - 1) as u32
    }

    fn add_triangle(&mut self, i1: u32, i2: u32, i3: u32) {
        if !self.accepts_geometry("add_triangle") {
            return;
        }
        let count = self.vertices.len() as u32;
        if i1 >= count || i2 >= count || i3 >= count {
            log::warn!(
                "Dropping triangle ({}, {}, {}) on chunk {:?}: only {} vertices",
                i1,
                i2,
                i3,
                self.position,
                count
            );
            return;
        }
        self.indices.extend_from_slice(&[i1, i2, i3]);
    }

    fn finish(&mut self) {
        if !self.accepts_geometry("finish") {
            return;
        }
        let uploaded = UploadedMesh {
            vertices: std::mem::take(&mut self.vertices),
            indices: std::mem::take(&mut self.indices),
        };
        if let Some(totals) = &self.totals {
            let mut totals = totals.get_mut();
            totals.live_meshes += 1;
            totals.builds += 1;
            totals.triangles += uploaded.triangle_count();
            totals.vertices += uploaded.vertices.len();
        }
        self.uploaded = Some(uploaded);
        self.state = CpuMeshState::Finished;
    }

    fn tear_down(&mut self) {
        if self.state == CpuMeshState::TornDown {
            log::warn!("Mesh of chunk {:?} torn down twice", self.position);
            return;
        }
        if let (Some(totals), Some(uploaded)) = (&self.totals, &self.uploaded) {
            let mut totals = totals.get_mut();
            totals.live_meshes = totals.live_meshes.saturating_sub(1);
            totals.triangles = totals.triangles.saturating_sub(uploaded.triangle_count());
            totals.vertices = totals.vertices.saturating_sub(uploaded.vertices.len());
        }
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.uploaded = None;
        self.state = CpuMeshState::TornDown;
    }
}

/// Creates [`CpuMesh`]es that report into shared [`MeshTotals`].
#[derive(Clone)]
pub struct CpuMeshFactory {
    totals: MtResource<MeshTotals>,
}

impl CpuMeshFactory {
    pub fn new() -> Self {
        CpuMeshFactory {
            totals: MtResource::new(MeshTotals::default()),
        }
    }

    pub fn totals(&self) -> MeshTotals {
        *self.totals.get()
    }
}

impl Default for CpuMeshFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshFactory for CpuMeshFactory {
    fn create_mesh(&self, position: ChunkPosition) -> Box<dyn MeshSink> {
        Box::new(CpuMesh::with_totals(position, self.totals.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(mesh: &mut CpuMesh) {
        mesh.set_color([0.2, 0.4, 0.6]);
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
    }

    #[test]
    fn finish_publishes_the_geometry() {
        let mut mesh = CpuMesh::new(Point3::new(0, 0, 0));
        quad(&mut mesh);
        assert!(mesh.uploaded().is_none());

        mesh.finish();
        let uploaded = mesh.uploaded().unwrap();
        assert_eq!(uploaded.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(uploaded.vertices[3].color, [0.2, 0.4, 0.6]);
        assert_eq!(uploaded.vertex_bytes().len(), 4 * Vertex::STRIDE);
        assert_eq!(uploaded.index_bytes().len(), 6 * 4);
        assert_eq!(mesh.state(), CpuMeshState::Finished);
    }

    #[test]
    fn calls_after_finish_are_ignored() {
        let mut mesh = CpuMesh::new(Point3::new(0, 0, 0));
        quad(&mut mesh);
        mesh.finish();
        quad(&mut mesh);
        mesh.finish();
        assert_eq!(mesh.uploaded().unwrap().triangle_count(), 2);
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mut mesh = CpuMesh::new(Point3::new(0, 0, 0));
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        mesh.add_triangle(0, 1, 2);
        mesh.finish();
        assert_eq!(mesh.uploaded().unwrap().triangle_count(), 0);
    }

    #[test]
    fn factory_totals_follow_finish_and_tear_down() {
        let factory = CpuMeshFactory::new();
        let mut first = CpuMesh::with_totals(Point3::new(0, 0, 0), factory.totals.clone());
        let mut second = CpuMesh::with_totals(Point3::new(1, 0, 0), factory.totals.clone());
        quad(&mut first);
        quad(&mut second);
        first.finish();
        second.finish();
        assert_eq!(
            factory.totals(),
            MeshTotals {
                live_meshes: 2,
                triangles: 4,
                vertices: 8,
                builds: 2
            }
        );

        first.tear_down();
        first.tear_down();
        assert_eq!(factory.totals().live_meshes, 1);
        assert_eq!(factory.totals().triangles, 2);
        assert_eq!(first.state(), CpuMeshState::TornDown);
    }
}
