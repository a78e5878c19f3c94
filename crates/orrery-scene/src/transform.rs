//! Scene constants and the per-frame model/projection math.

use glam::{Mat3, Mat4, Vec3};

/// Position of the star, also the centre of the planet's orbit.
pub const STAR_POSITION: Vec3 = Vec3::new(0.0, 0.0, -3.0);

/// Radiance of the star as seen by the planet shader.
pub const SUN_EMISSION: Vec3 = Vec3::new(6.0, 6.0, 6.0);

pub const ORBIT_RADIUS: f32 = 3.0;

/// Seconds per radian of orbital angle.
pub const ORBIT_TIME_SCALE: f32 = 100.0;

/// Seconds per radian of planet spin.
pub const SPIN_TIME_SCALE: f32 = 10.0;

pub const AXIAL_TILT_DEGREES: f32 = 23.5;

pub const FOV_Y_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 10_000.0;

/// Planet position relative to the orbit centre at `time` seconds.
#[must_use]
pub fn orbit_offset(time: f32) -> Vec3 {
    let angle = time / ORBIT_TIME_SCALE;
    Vec3::new(ORBIT_RADIUS * angle.cos(), 0.0, ORBIT_RADIUS * angle.sin())
}

/// Orbit translation, then spin about world up, then axial tilt about +X.
#[must_use]
pub fn planet_model(time: f32) -> Mat4 {
    Mat4::from_translation(STAR_POSITION + orbit_offset(time))
        * Mat4::from_rotation_y(-time / SPIN_TIME_SCALE)
        * Mat4::from_rotation_x(AXIAL_TILT_DEGREES.to_radians())
}

#[must_use]
pub fn star_model() -> Mat4 {
    Mat4::from_translation(STAR_POSITION)
}

/// Inverse-transpose of the model's upper 3x3, for transforming normals.
#[must_use]
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    Mat3::from_mat4(*model).inverse().transpose()
}

/// Right-handed perspective with a 0..1 depth range.
#[must_use]
pub fn projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect_ratio, Z_NEAR, Z_FAR)
}
