//! Yaw/pitch free-look camera.
//!
//! Orientation is stored as Euler angles in degrees. The basis vectors are
//! re-derived from the angles on every [`CameraController::advance`], never
//! integrated.

use glam::{Mat4, Vec3};
use orrery_config::CameraConfig;
use orrery_input::InputState;

/// World up axis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Pitch limit in degrees, keeping the view off the poles.
pub const MAX_PITCH_DEGREES: f32 = 89.0;

/// Position, orientation, and the derived basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    /// Degrees. 270 looks down -Z.
    pub yaw: f32,
    /// Degrees, within [-89, 89].
    pub pitch: f32,
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), 270.0, 0.0)
    }
}

impl CameraState {
    #[must_use]
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut state = Self {
            position,
            yaw,
            pitch: pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: WORLD_UP,
        };
        state.update_vectors();
        state
    }

    /// Recompute front, right and up from yaw and pitch.
    pub fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Front projected onto the horizontal plane.
    #[must_use]
    pub fn horizontal_forward(&self) -> Vec3 {
        Vec3::new(self.front.x, 0.0, self.front.z).normalize_or_zero()
    }

    /// Right-handed look-at toward `position + front`.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

/// Turns input into camera motion once per frame.
#[derive(Debug, Clone)]
pub struct CameraController {
    state: CameraState,
    /// Degrees per pointer unit.
    sensitivity: f32,
    /// Units per second.
    speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraState::default(), 0.1, 1.0)
    }
}

impl CameraController {
    #[must_use]
    pub fn new(state: CameraState, sensitivity: f32, speed: f32) -> Self {
        Self {
            state,
            sensitivity,
            speed,
        }
    }

    #[must_use]
    pub fn from_config(config: &CameraConfig) -> Self {
        let state = CameraState::new(
            Vec3::from_array(config.start_position),
            config.start_yaw,
            config.start_pitch,
        );
        Self::new(state, config.mouse_sensitivity, config.move_speed)
    }

    #[must_use]
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Turn by a pointer delta; positive `dy` looks down.
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.state.yaw += dx * self.sensitivity;
        self.state.pitch = (self.state.pitch - dy * self.sensitivity)
            .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    }

    /// Consume pending pointer motion, rebuild the basis, then move along the
    /// held axes for `dt` seconds.
    pub fn advance(&mut self, input: &mut InputState, dt: f32) {
        let delta = input.take_pointer_delta();
        self.apply_pointer_delta(delta.x, delta.y);
        self.state.update_vectors();

        let axes = input.axes().as_vec3();
        let step = dt * self.speed;
        self.state.position += self.state.right * axes.x * step + WORLD_UP * axes.y * step
            - self.state.horizontal_forward() * axes.z * step;
    }
}
