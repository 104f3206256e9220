//! # Viewer Module
//!
//! Where the world is being looked at from. The streamer asks a [`ViewerPositionProvider`] once
//! per pass and never holds on to the answer.

use cgmath::{Point3, Vector3};

use crate::core::MtResource;

/// Reports the position the world is streamed around.
pub trait ViewerPositionProvider: Send + Sync {
    fn viewer_position(&self) -> Point3<f64>;
}

/// A viewer position that the owner moves and the streaming thread reads.
///
/// Clones share the same position.
#[derive(Clone)]
pub struct TrackedViewer {
    position: MtResource<Point3<f64>>,
}

impl TrackedViewer {
    pub fn new(position: Point3<f64>) -> Self {
        TrackedViewer {
            position: MtResource::new(position),
        }
    }

    pub fn set_position(&self, position: Point3<f64>) {
        *self.position.get_mut() = position;
    }

    /// Moves the viewer by `delta`.
    pub fn translate(&self, delta: Vector3<f64>) {
        *self.position.get_mut() += delta;
    }
}

impl ViewerPositionProvider for TrackedViewer {
    fn viewer_position(&self) -> Point3<f64> {
        *self.position.get()
    }
}

/// A viewer that never moves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedViewer(pub Point3<f64>);

impl ViewerPositionProvider for FixedViewer {
    fn viewer_position(&self) -> Point3<f64> {
        self.0
    }
}
