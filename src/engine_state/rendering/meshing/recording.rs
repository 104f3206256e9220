//! A mesh sink that records every call it receives.
//!
//! Clones of a [`RecordingMeshSink`] share one log, so a test can keep a handle to a sink after
//! handing a boxed clone to the world and inspect what happened to it later.

use cgmath::Point3;

use super::{MeshFactory, MeshSink};
use crate::core::MtResource;
use crate::engine_state::voxels::chunk::ChunkPosition;

/// One recorded sink call.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshEvent {
    SetColor([f32; 3]),
    AddVertex(Point3<f32>),
    AddTriangle(u32, u32, u32),
    Finish,
    TearDown,
}

#[derive(Default)]
struct MeshLog {
    events: Vec<MeshEvent>,
    vertices: u32,
}

/// Mesh sink test double.
#[derive(Clone)]
pub struct RecordingMeshSink {
    position: Option<ChunkPosition>,
    log: MtResource<MeshLog>,
}

impl RecordingMeshSink {
    pub fn new() -> Self {
        RecordingMeshSink {
            position: None,
            log: MtResource::new(MeshLog::default()),
        }
    }

    /// A sink tagged with the chunk it was created for.
    pub fn for_chunk(position: ChunkPosition) -> Self {
        RecordingMeshSink {
            position: Some(position),
            ..Self::new()
        }
    }

    pub fn position(&self) -> Option<ChunkPosition> {
        self.position
    }

    /// Every call so far, in order.
    pub fn events(&self) -> Vec<MeshEvent> {
        self.log.get().events.clone()
    }

    pub fn vertex_count(&self) -> usize {
        self.count(|event| matches!(event, MeshEvent::AddVertex(_)))
    }

    pub fn triangle_count(&self) -> usize {
        self.count(|event| matches!(event, MeshEvent::AddTriangle(..)))
    }

    pub fn is_finished(&self) -> bool {
        self.count(|event| *event == MeshEvent::Finish) > 0
    }

    pub fn is_torn_down(&self) -> bool {
        self.count(|event| *event == MeshEvent::TearDown) > 0
    }

    /// The color of each emitted face, in emission order.
    pub fn face_colors(&self) -> Vec<[f32; 3]> {
        self.log
            .get()
            .events
            .iter()
            .filter_map(|event| match event {
                MeshEvent::SetColor(color) => Some(*color),
                _ => None,
            })
            .collect()
    }

    pub fn vertex_positions(&self) -> Vec<Point3<f32>> {
        self.log
            .get()
            .events
            .iter()
            .filter_map(|event| match event {
                MeshEvent::AddVertex(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Checks the log against the sink contract: whole faces (a color, four vertices, two
    /// triangles over those vertices), then at most one `Finish`, then at most one `TearDown`,
    /// then nothing.
    ///
    /// # Returns
    /// The number of faces on success, or a description of the first violation.
    pub fn check_face_order(&self) -> Result<usize, String> {
        let log = self.log.get();
        let events = &log.events;
        let mut faces = 0;
        let mut next_vertex = 0;
        let mut i = 0;

        while let Some(MeshEvent::SetColor(_)) = events.get(i) {
            let mut indices = [0u32; 4];
            for (slot, index) in indices.iter_mut().enumerate() {
                match events.get(i + 1 + slot) {
                    Some(MeshEvent::AddVertex(_)) => {
                        *index = next_vertex;
                        next_vertex += 1;
                    }
                    other => return Err(format!("face {faces}: expected vertex, got {other:?}")),
                }
            }
            let [a, b, c, d] = indices;
            let expected = [
                MeshEvent::AddTriangle(a, b, c),
                MeshEvent::AddTriangle(a, c, d),
            ];
            if events.get(i + 5..i + 7) != Some(&expected[..]) {
                return Err(format!("face {faces}: triangles do not match its vertices"));
            }
            faces += 1;
            i += 7;
        }

        let mut rest = events[i..].iter();
        let mut next = rest.next();
        if next == Some(&MeshEvent::Finish) {
            next = rest.next();
        }
        if next == Some(&MeshEvent::TearDown) {
            next = rest.next();
        }
        match next {
            None => Ok(faces),
            Some(event) => Err(format!("unexpected {event:?} after {faces} faces")),
        }
    }

    fn count(&self, predicate: impl Fn(&MeshEvent) -> bool) -> usize {
        self.log.get().events.iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: MeshEvent) {
        self.log.get_mut().events.push(event);
    }
}

impl Default for RecordingMeshSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshSink for RecordingMeshSink {
    fn set_color(&mut self, color: [f32; 3]) {
        self.record(MeshEvent::SetColor(color));
    }

    fn add_vertex(&mut self, position: Point3<f32>) -> u32 {
        let mut log = self.log.get_mut();
        log.events.push(MeshEvent::AddVertex(position));
        log.vertices += 1;
        log.vertices - 1
    }

    fn add_triangle(&mut self, i1: u32, i2: u32, i3: u32) {
        self.record(MeshEvent::AddTriangle(i1, i2, i3));
    }

    fn finish(&mut self) {
        self.record(MeshEvent::Finish);
    }

    fn tear_down(&mut self) {
        self.record(MeshEvent::TearDown);
    }
}

/// Hands out [`RecordingMeshSink`]s and remembers every one of them.
#[derive(Clone)]
pub struct RecordingMeshFactory {
    created: MtResource<Vec<RecordingMeshSink>>,
}

impl RecordingMeshFactory {
    pub fn new() -> Self {
        RecordingMeshFactory {
            created: MtResource::new(Vec::new()),
        }
    }

    /// Every sink created so far, oldest first.
    pub fn meshes(&self) -> Vec<RecordingMeshSink> {
        self.created.get().clone()
    }

    /// Sinks created for one chunk, oldest first.
    pub fn meshes_for(&self, position: ChunkPosition) -> Vec<RecordingMeshSink> {
        self.created
            .get()
            .iter()
            .filter(|sink| sink.position() == Some(position))
            .cloned()
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.created.get().len()
    }
}

impl Default for RecordingMeshFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshFactory for RecordingMeshFactory {
    fn create_mesh(&self, position: ChunkPosition) -> Box<dyn MeshSink> {
        let sink = RecordingMeshSink::for_chunk(position);
        self.created.get_mut().push(sink.clone());
        Box::new(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_face(sink: &mut dyn MeshSink) {
        sink.set_color([1.0, 0.0, 0.0]);
        let indices: Vec<u32> = (0..4)
            .map(|i| sink.add_vertex(Point3::new(i as f32, 0.0, 0.0)))
            .collect();
        sink.add_triangle(indices[0], indices[1], indices[2]);
        sink.add_triangle(indices[0], indices[2], indices[3]);
    }

    #[test]
    fn clones_share_the_log() {
        let handle = RecordingMeshSink::new();
        let mut boxed: Box<dyn MeshSink> = Box::new(handle.clone());
        emit_face(boxed.as_mut());
        boxed.finish();

        assert_eq!(handle.vertex_count(), 4);
        assert!(handle.is_finished());
        assert_eq!(handle.check_face_order(), Ok(1));
    }

    #[test]
    fn vertex_indices_continue_across_faces() {
        let mut sink = RecordingMeshSink::new();
        emit_face(&mut sink);
        emit_face(&mut sink);
        assert_eq!(sink.events()[11], MeshEvent::AddTriangle(4, 5, 6));
        assert_eq!(sink.check_face_order(), Ok(2));
    }

    #[test]
    fn contract_violations_are_reported() {
        let mut sink = RecordingMeshSink::new();
        sink.tear_down();
        emit_face(&mut sink);
        assert!(sink.check_face_order().is_err());

        let mut sink = RecordingMeshSink::new();
        sink.set_color([0.0; 3]);
        sink.add_vertex(Point3::new(0.0, 0.0, 0.0));
        sink.add_triangle(0, 0, 0);
        assert!(sink.check_face_order().is_err());
    }

    #[test]
    fn factory_tracks_sinks_per_chunk() {
        let factory = RecordingMeshFactory::new();
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, 0, 0);
        factory.create_mesh(a);
        factory.create_mesh(b);
        factory.create_mesh(a);

        assert_eq!(factory.created_count(), 3);
        assert_eq!(factory.meshes_for(a).len(), 2);
        assert_eq!(factory.meshes_for(b)[0].position(), Some(b));
    }
}
