use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Half the edge length of a voxel cube.
const HALF: f32 = 0.5;

// Cube corners relative to the voxel center.
const P1: Vector3<f32> = Vector3::new(-HALF, -HALF, HALF);
const P2: Vector3<f32> = Vector3::new(HALF, -HALF, HALF);
const P3: Vector3<f32> = Vector3::new(HALF, HALF, HALF);
const P4: Vector3<f32> = Vector3::new(-HALF, HALF, HALF);
const P5: Vector3<f32> = Vector3::new(HALF, -HALF, -HALF);
const P6: Vector3<f32> = Vector3::new(-HALF, -HALF, -HALF);
const P7: Vector3<f32> = Vector3::new(-HALF, HALF, -HALF);
const P8: Vector3<f32> = Vector3::new(HALF, HALF, -HALF);

/// A single quad face of a voxel, ready to hand to a mesh sink.
///
/// The corners wind counter-clockwise when seen from outside the cube, so the two triangles
/// `(0, 1, 2)` and `(0, 2, 3)` face outwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// World-space corners in emission order
    pub corners: [Point3<f32>; 4],
    /// Which side of the voxel this face covers
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face on `block_side` of the voxel centered at `center`.
    pub fn new(center: Point3<f32>, block_side: BlockSide) -> Self {
        let offsets = match block_side {
            BlockSide::FRONT => [P1, P2, P3, P4],
            BlockSide::BACK => [P5, P6, P7, P8],
            BlockSide::RIGHT => [P2, P5, P8, P3],
            BlockSide::LEFT => [P6, P1, P4, P7],
            BlockSide::TOP => [P4, P3, P8, P7],
            BlockSide::BOTTOM => [P6, P5, P2, P1],
        };
        Face {
            corners: offsets.map(|offset| center + offset),
            block_side,
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn corners_lie_on_the_face_plane() {
        let center = Point3::new(3.0, -2.0, 7.0);
        for side in BlockSide::all() {
            let face = Face::new(center, side);
            let offset = side.offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0));
            for corner in face.corners {
                assert_eq!((corner - center).dot(offset), HALF);
            }
        }
    }

    #[test]
    fn triangles_face_outwards() {
        let center = Point3::new(0.0, 0.0, 0.0);
        for side in BlockSide::all() {
            let [a, b, c, _] = Face::new(center, side).corners;
            let normal = (b - a).cross(c - a);
            let outward = side.offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0));
            assert!(normal.dot(outward) > 0.0, "{side:?} winds inwards");
        }
    }
}
