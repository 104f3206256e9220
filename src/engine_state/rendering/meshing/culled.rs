//! Face-culled meshing.
//!
//! Emits one quad for every face of a solid voxel whose neighbor across that face is empty.
//! Faces on the chunk boundary look into the linked neighbor chunk on that side; with no linked
//! neighbor the outside counts as empty, so the face is drawn.
//!
//! # Face Color
//!
//! ```text
//! light  = max(sunlight, torchlight) of the voxel in front of the face, 15 outside the world
//! factor = 0.86 + (light / 16) ^ 1.4
//! ```
//!
//! Lit block types multiply their base color by `factor`; flat types ignore light.

use cgmath::Point3;

use super::face::Face;
use super::MeshSink;
use crate::engine_state::voxels::{
    block::{block_side::BlockSide, block_type::BlockType, BlockTint},
    chunk::{
        storage::{voxel_index_unchecked, ChunkData, MAX_LIGHT_LEVEL},
        CHUNK_DIMENSION,
    },
};

/// Brightness added to every lit face regardless of light level.
pub const BASE_AMBIENT: f32 = 0.86;

/// Exponent of the light falloff curve.
pub const LIGHT_EXPONENT: f32 = 1.4;

const LAST: usize = (CHUNK_DIMENSION - 1) as usize;

/// Counts of what a build emitted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub quads: usize,
    pub triangles: usize,
    pub vertices: usize,
}

/// The color of a face of `block_type` lit at `light`, or `None` for invisible types.
pub fn face_color(block_type: BlockType, light: u8) -> Option<[f32; 3]> {
    match block_type.tint() {
        BlockTint::Lit(base) => {
            let factor = BASE_AMBIENT + (light as f32 / 16.0).powf(LIGHT_EXPONENT);
            Some(base.map(|channel| channel * factor))
        }
        BlockTint::Flat(color) => Some(color),
        BlockTint::Invisible => None,
    }
}

/// A snapshot of one chunk and its linked neighbors, ready to be meshed.
pub struct CulledMesher<'a> {
    data: &'a ChunkData,
    origin: Point3<f64>,
    /// Neighbor data per side, indexed by `BlockSide as usize`.
    neighbors: [Option<&'a ChunkData>; 6],
}

impl<'a> CulledMesher<'a> {
    /// # Arguments
    /// * `data` - Voxel data of the chunk being meshed
    /// * `origin` - World position of the chunk's local voxel `(0, 0, 0)`
    /// * `neighbors` - Linked neighbor data in `BlockSide` order
    pub fn new(
        data: &'a ChunkData,
        origin: Point3<f64>,
        neighbors: [Option<&'a ChunkData>; 6],
    ) -> Self {
        CulledMesher {
            data,
            origin,
            neighbors,
        }
    }

    /// Streams every visible face into `sink`. Does not call `finish`.
    pub fn build(&self, sink: &mut dyn MeshSink) -> MeshStats {
        let mut stats = MeshStats::default();

        for voxel in self.data.blocks.iter_solid() {
            let local = voxel.local;
            let center = Point3::new(
                (self.origin.x + local.x as f64) as f32,
                (self.origin.y + local.y as f64) as f32,
                (self.origin.z + local.z as f64) as f32,
            );

            for side in BlockSide::all() {
                let Some(light) = self.visible_face_light(local, side) else {
                    continue;
                };
                let Some(color) = face_color(voxel.block_type, light) else {
                    continue;
                };

                let face = Face::new(center, side);
                sink.set_color(color);
                let [a, b, c, d] = face.corners.map(|corner| sink.add_vertex(corner));
                sink.add_triangle(a, b, c);
                sink.add_triangle(a, c, d);

                stats.quads += 1;
                stats.triangles += 2;
                stats.vertices += 4;
            }
        }

        stats
    }

    /// Light level in front of the face, or `None` when the face is hidden.
    fn visible_face_light(&self, local: Point3<usize>, side: BlockSide) -> Option<u8> {
        let (data, x, y, z) = match self.step(local, side) {
            Step::Inside(x, y, z) => (self.data, x, y, z),
            Step::Neighbor(data, x, y, z) => (data, x, y, z),
            Step::Open => return Some(MAX_LIGHT_LEVEL),
        };
        if data.blocks.is_solid_at(x, y, z) {
            return None;
        }
        Some(data.light.brightness_at(voxel_index_unchecked(x, y, z)))
    }

    /// Resolves the voxel across `side`, possibly in a neighbor chunk.
    fn step(&self, local: Point3<usize>, side: BlockSide) -> Step<'a> {
        let mut coords = [local.x, local.y, local.z];
        let axis = side.axis();
        let crossing = if side.is_positive() {
            coords[axis] == LAST
        } else {
            coords[axis] == 0
        };

        if !crossing {
            if side.is_positive() {
                coords[axis] += 1;
            } else {
                coords[axis] -= 1;
            }
            return Step::Inside(coords[0], coords[1], coords[2]);
        }

        match self.neighbors[side as usize] {
            Some(neighbor) => {
                coords[axis] = if side.is_positive() { 0 } else { LAST };
                Step::Neighbor(neighbor, coords[0], coords[1], coords[2])
            }
            None => Step::Open,
        }
    }
}

enum Step<'a> {
    Inside(usize, usize, usize),
    Neighbor(&'a ChunkData, usize, usize, usize),
    Open,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::recording::RecordingMeshSink;
    use crate::engine_state::voxels::chunk::storage::VoxelGrid;

    const N: usize = CHUNK_DIMENSION as usize;

    fn solid_data() -> ChunkData {
        ChunkData {
            blocks: VoxelGrid::filled(BlockType::GRASS),
            ..ChunkData::default()
        }
    }

    fn mesh(data: &ChunkData, neighbors: [Option<&ChunkData>; 6]) -> (MeshStats, RecordingMeshSink) {
        let mut sink = RecordingMeshSink::new();
        let stats = CulledMesher::new(data, Point3::new(0.0, 0.0, 0.0), neighbors).build(&mut sink);
        (stats, sink)
    }

    #[test]
    fn empty_chunk_emits_nothing() {
        let (stats, sink) = mesh(&ChunkData::default(), [None; 6]);
        assert_eq!(stats, MeshStats::default());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn lone_voxel_emits_six_quads() {
        let mut data = ChunkData::default();
        data.blocks.set(Point3::new(4, 5, 6), BlockType::GRASS).unwrap();

        let (stats, sink) = mesh(&data, [None; 6]);
        assert_eq!(
            stats,
            MeshStats {
                quads: 6,
                triangles: 12,
                vertices: 24
            }
        );
        assert_eq!(sink.triangle_count(), 12);
        assert_eq!(sink.vertex_count(), 24);
        assert_eq!(sink.check_face_order(), Ok(6));
    }

    #[test]
    fn solid_chunk_without_neighbors_shows_its_shell() {
        let data = solid_data();
        let (stats, _) = mesh(&data, [None; 6]);
        assert_eq!(stats.quads, 6 * N * N);
    }

    #[test]
    fn solid_chunk_between_solid_neighbors_is_fully_occluded() {
        let data = solid_data();
        let neighbor = solid_data();
        let (stats, sink) = mesh(&data, [Some(&neighbor); 6]);
        assert_eq!(stats.quads, 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn empty_neighbor_exposes_only_its_side() {
        let data = solid_data();
        let solid = solid_data();
        let empty = ChunkData::default();
        let mut neighbors = [Some(&solid); 6];
        neighbors[BlockSide::TOP as usize] = Some(&empty);

        let (stats, _) = mesh(&data, neighbors);
        assert_eq!(stats.quads, N * N);
    }

    #[test]
    fn adjacent_solid_voxels_hide_their_shared_faces() {
        let mut data = ChunkData::default();
        data.blocks.set(Point3::new(1, 1, 1), BlockType::GRASS).unwrap();
        data.blocks.set(Point3::new(2, 1, 1), BlockType::STONE).unwrap();
        let (stats, _) = mesh(&data, [None; 6]);
        assert_eq!(stats.quads, 10);
    }

    #[test]
    fn grass_is_shaded_by_the_light_in_front_of_it() {
        let mut data = ChunkData::default();
        data.blocks.set(Point3::new(1, 1, 1), BlockType::GRASS).unwrap();
        data.light.set_torchlight(Point3::new(1, 2, 1), 8).unwrap();

        let (_, sink) = mesh(&data, [None; 6]);
        let colors = sink.face_colors();
        let lit = face_color(BlockType::GRASS, 8).unwrap();
        let dark = face_color(BlockType::GRASS, 0).unwrap();
        assert_eq!(colors.iter().filter(|c| **c == lit).count(), 1);
        assert_eq!(colors.iter().filter(|c| **c == dark).count(), 5);
    }

    #[test]
    fn open_boundary_faces_are_fully_lit() {
        let mut data = ChunkData::default();
        data.blocks.set(Point3::new(0, 10, 10), BlockType::GRASS).unwrap();
        let (_, sink) = mesh(&data, [None; 6]);
        let full = face_color(BlockType::GRASS, 15).unwrap();
        assert_eq!(sink.face_colors().iter().filter(|c| **c == full).count(), 1);
    }

    #[test]
    fn face_color_follows_the_falloff_curve() {
        let dark = face_color(BlockType::GRASS, 0).unwrap();
        assert_eq!(dark, [0.094 * 0.86, 0.568 * 0.86, 0.109 * 0.86]);

        let bright = face_color(BlockType::GRASS, 15).unwrap();
        let factor = 0.86 + (15.0f32 / 16.0).powf(1.4);
        assert_eq!(bright[1], 0.568 * factor);

        assert_eq!(face_color(BlockType::STONE, 0), face_color(BlockType::STONE, 15));
        assert_eq!(face_color(BlockType::EMPTY, 15), None);
    }

    #[test]
    fn faces_are_placed_around_the_voxel_center() {
        let mut data = ChunkData::default();
        data.blocks.set(Point3::new(0, 0, 0), BlockType::STONE).unwrap();
        let mut sink = RecordingMeshSink::new();
        CulledMesher::new(&data, Point3::new(32.0, 0.0, -32.0), [None; 6]).build(&mut sink);

        for position in sink.vertex_positions() {
            assert!((position.x - 32.0).abs() == 0.5);
            assert!(position.y.abs() == 0.5);
            assert!((position.z + 32.0).abs() == 0.5);
        }
    }
}
