//! First-person free-look camera driven by [`orrery_input::InputState`].

pub mod camera;

pub use camera::{CameraController, CameraState, MAX_PITCH_DEGREES, WORLD_UP};
