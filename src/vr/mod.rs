//! Headset viewer: the catalog, the player, and the UI manager, driven by a
//! host loop through explicit `init`/`tick`/`shutdown` calls. Rendering and
//! controller input belong to the host; these types only decide what to do.

pub mod catalog;
pub mod player;
pub mod ui;
pub mod video_type;

use std::ops::{Add, Mul, Sub};

pub use catalog::{RefreshOutcome, VideoSource, VrCatalog, VrVideoItem};
pub use player::{DisplaySetup, PlaybackPhase, VrPlayer, VrRenderer};
pub use ui::{Button, CameraPose, Control, ControlBindings, UiAction, UiPose, VrUiManager};
pub use video_type::VideoType;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction; zero stays zero.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 { self } else { self * (1.0 / len) }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}
