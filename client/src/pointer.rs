use presence_shared::vec3::{Quat, Vec3};

use crate::input::{ButtonState, InputTracker};
use crate::surface::Ray;

pub const POINTER_COUNT: usize = 2;

/// What the input device reports for one hand-held pointer this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub ray: Ray,
    /// Controller orientation, copied onto held objects
    pub orientation: Quat,
    pub buttons: ButtonState,
}

impl PointerInput {
    pub fn position(&self) -> Vec3 {
        self.ray.origin
    }
}

impl Default for PointerInput {
    fn default() -> Self {
        Self {
            ray: Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)),
            orientation: Quat::IDENTITY,
            buttons: ButtonState::default(),
        }
    }
}

/// Per-pointer state carried between frames.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub input: PointerInput,
    pub tracker: InputTracker,
    pub grabbed_object_id: Option<u32>,
}

impl PointerState {
    pub fn position(&self) -> Vec3 {
        self.input.position()
    }
}
