//! Parameter handles resolved once per program after linking.
//!
//! A name the program does not declare resolves to the invalid handle and is
//! reported once here; writes through it are silently dropped at frame time.

use log::warn;
use orrery_render::{ParamHandle, ShadingProgram};

fn resolve(program: &ShadingProgram, name: &str) -> ParamHandle {
    let handle = program.param(name);
    if !handle.is_valid() {
        warn!(
            "Program '{}' has no parameter '{name}'; writes to it will be ignored",
            program.label()
        );
    }
    handle
}

#[derive(Debug, Clone, Copy)]
pub struct SkyboxParams {
    pub view: ParamHandle,
    pub projection: ParamHandle,
    pub skybox: ParamHandle,
}

impl SkyboxParams {
    pub fn resolve(program: &ShadingProgram) -> Self {
        Self {
            view: resolve(program, "view"),
            projection: resolve(program, "projection"),
            skybox: resolve(program, "skybox"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanetParams {
    pub model: ParamHandle,
    pub normal_matrix: ParamHandle,
    pub view: ParamHandle,
    pub projection: ParamHandle,
    pub camera_pos: ParamHandle,
    pub day_side: ParamHandle,
    pub night_side: ParamHandle,
    pub roughness_map: ParamHandle,
    pub clouds: ParamHandle,
    pub normal_map: ParamHandle,
    pub normal_mapping: ParamHandle,
    pub oren_nayar: ParamHandle,
    pub sun_position: ParamHandle,
    pub sun_emission: ParamHandle,
}

impl PlanetParams {
    pub fn resolve(program: &ShadingProgram) -> Self {
        Self {
            model: resolve(program, "model"),
            normal_matrix: resolve(program, "normalMtrx"),
            view: resolve(program, "view"),
            projection: resolve(program, "projection"),
            camera_pos: resolve(program, "cameraPos"),
            day_side: resolve(program, "daySide"),
            night_side: resolve(program, "nightSide"),
            roughness_map: resolve(program, "roughnessMap"),
            clouds: resolve(program, "clouds"),
            normal_map: resolve(program, "normalMap"),
            normal_mapping: resolve(program, "normalMapping"),
            oren_nayar: resolve(program, "orenNayar"),
            sun_position: resolve(program, "sun.position"),
            sun_emission: resolve(program, "sun.emission"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StarParams {
    pub model: ParamHandle,
    pub normal_matrix: ParamHandle,
    pub view: ParamHandle,
    pub projection: ParamHandle,
    pub camera_pos: ParamHandle,
    pub time: ParamHandle,
    /// Named `cubeMap` in the shader but holds the flat star texture.
    pub texture: ParamHandle,
}

impl StarParams {
    pub fn resolve(program: &ShadingProgram) -> Self {
        Self {
            model: resolve(program, "model"),
            normal_matrix: resolve(program, "normalMtrx"),
            view: resolve(program, "view"),
            projection: resolve(program, "projection"),
            camera_pos: resolve(program, "cameraPos"),
            time: resolve(program, "time"),
            texture: resolve(program, "cubeMap"),
        }
    }
}
