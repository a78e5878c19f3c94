//! Owns every GPU resource of the scene and records its three passes.

use std::path::Path;

use glam::{Mat4, Vec3};
use log::info;
use orrery_config::AssetConfig;
use orrery_input::Toggle;
use orrery_player::CameraState;
use orrery_render::{
    CubeFaces, DefaultBindings, Mesh, ProgramDescriptor, ShadingProgram, StageKind, Texture,
    VertexPosition, VertexPositionNormal, compile_stage_file, link, load_cube_map,
    load_flat_from_path,
};

use crate::error::SceneError;
use crate::geometry::{SPHERE_SUBDIVISIONS, cube_vertices, sphere_vertices};
use crate::params::{PlanetParams, SkyboxParams, StarParams};
use crate::passes::{
    MeshId, PLANET_PASS, PassDescriptor, PassId, SCENE_PASSES, SKYBOX_PASS, STAR_PASS,
};
use crate::transform::{
    STAR_POSITION, SUN_EMISSION, normal_matrix, planet_model, projection, star_model,
};

/// Shading switches flipped from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneToggles {
    pub normal_mapping: bool,
    /// Oren-Nayar diffuse when set, Lambert otherwise.
    pub oren_nayar: bool,
}

impl Default for SceneToggles {
    fn default() -> Self {
        Self {
            normal_mapping: true,
            oren_nayar: true,
        }
    }
}

impl SceneToggles {
    pub fn apply(&mut self, toggle: Toggle) {
        let flag = match toggle {
            Toggle::NormalMapping => &mut self.normal_mapping,
            Toggle::OrenNayar => &mut self.oren_nayar,
        };
        *flag = !*flag;
        info!(
            "Normal mapping {}, {} diffuse",
            if self.normal_mapping { "on" } else { "off" },
            if self.oren_nayar { "Oren-Nayar" } else { "Lambert" }
        );
    }
}

/// Textures kept alive for the lifetime of the renderer.
struct SceneTextures {
    _day: Texture,
    _night: Texture,
    _roughness: Texture,
    _clouds: Texture,
    _normal: Texture,
    _star: Texture,
    _skybox: Texture,
}

pub struct SceneRenderer {
    sphere: Mesh,
    cube: Mesh,
    skybox: ShadingProgram,
    planet: ShadingProgram,
    star: ShadingProgram,
    skybox_params: SkyboxParams,
    planet_params: PlanetParams,
    star_params: StarParams,
    _textures: SceneTextures,
    aspect_ratio: f32,
}

fn build_program(
    device: &wgpu::Device,
    defaults: &DefaultBindings,
    assets: &AssetConfig,
    color_format: wgpu::TextureFormat,
    pass: &PassDescriptor,
) -> Result<ShadingProgram, SceneError> {
    let vertex = compile_stage_file(&assets.shader_path(pass.vertex_shader), StageKind::Vertex)?;
    let fragment = compile_stage_file(
        &assets.shader_path(pass.fragment_shader),
        StageKind::Fragment,
    )?;
    let vertex_layout = match pass.mesh {
        MeshId::Cube => VertexPosition::layout(),
        MeshId::Sphere => VertexPositionNormal::layout(),
    };
    let desc = ProgramDescriptor {
        label: pass.label,
        vertex_layout,
        color_format,
        depth_write: pass.depth_write,
        depth_compare: pass.depth_compare,
        cull_mode: pass.cull_mode,
    };
    Ok(link(device, &desc, defaults, vertex, fragment)?)
}

/// Per-frame values shared by the three passes.
struct FrameParams {
    view: Mat4,
    projection: Mat4,
    camera_position: Vec3,
    time: f32,
    toggles: SceneToggles,
}

fn write_skybox(program: &mut ShadingProgram, params: &SkyboxParams, frame: &FrameParams) {
    program.set_mat4(params.view, &frame.view);
    program.set_mat4(params.projection, &frame.projection);
}

fn write_planet(program: &mut ShadingProgram, params: &PlanetParams, frame: &FrameParams) {
    let model = planet_model(frame.time);
    program.set_mat4(params.model, &model);
    program.set_mat3(params.normal_matrix, &normal_matrix(&model));
    program.set_mat4(params.view, &frame.view);
    program.set_mat4(params.projection, &frame.projection);
    program.set_vec3(params.camera_pos, frame.camera_position);
    program.set_bool(params.normal_mapping, frame.toggles.normal_mapping);
    program.set_bool(params.oren_nayar, frame.toggles.oren_nayar);
}

fn write_star(program: &mut ShadingProgram, params: &StarParams, frame: &FrameParams) {
    let model = star_model();
    program.set_mat4(params.model, &model);
    program.set_mat3(params.normal_matrix, &normal_matrix(&model));
    program.set_mat4(params.view, &frame.view);
    program.set_mat4(params.projection, &frame.projection);
    program.set_vec3(params.camera_pos, frame.camera_position);
    program.set_f32(params.time, frame.time);
}

impl SceneRenderer {
    /// Compile and link the three programs, load every texture and upload the
    /// meshes. Any failure aborts startup.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        assets: &AssetConfig,
        aspect_ratio: f32,
    ) -> Result<Self, SceneError> {
        let defaults = DefaultBindings::new(device, queue)?;

        let mut skybox = build_program(device, &defaults, assets, color_format, &SKYBOX_PASS)?;
        let mut planet = build_program(device, &defaults, assets, color_format, &PLANET_PASS)?;
        let mut star = build_program(device, &defaults, assets, color_format, &STAR_PASS)?;

        let skybox_params = SkyboxParams::resolve(&skybox);
        let planet_params = PlanetParams::resolve(&planet);
        let star_params = StarParams::resolve(&star);

        let flat = |path: &Path| load_flat_from_path(device, queue, &assets.resolve(path));
        let textures = SceneTextures {
            _day: flat(&assets.planet.day)?,
            _night: flat(&assets.planet.night)?,
            _roughness: flat(&assets.planet.roughness)?,
            _clouds: flat(&assets.planet.clouds)?,
            _normal: flat(&assets.planet.normal)?,
            _star: flat(&assets.star_texture)?,
            _skybox: load_cube_map(
                device,
                queue,
                "skybox",
                &CubeFaces::decode(&assets.resolved_skybox_faces())?,
            )?,
        };

        skybox.bind_texture(device, skybox_params.skybox, &textures._skybox);
        planet.bind_texture(device, planet_params.day_side, &textures._day);
        planet.bind_texture(device, planet_params.night_side, &textures._night);
        planet.bind_texture(device, planet_params.roughness_map, &textures._roughness);
        planet.bind_texture(device, planet_params.clouds, &textures._clouds);
        planet.bind_texture(device, planet_params.normal_map, &textures._normal);
        star.bind_texture(device, star_params.texture, &textures._star);

        planet.set_vec3(planet_params.sun_position, STAR_POSITION);
        planet.set_vec3(planet_params.sun_emission, SUN_EMISSION);

        let sphere = Mesh::new(
            device,
            "sphere",
            &sphere_vertices(SPHERE_SUBDIVISIONS),
            VertexPositionNormal::layout(),
        );
        let cube = Mesh::new(device, "cube", &cube_vertices(), VertexPosition::layout());

        info!("Scene ready");
        Ok(Self {
            sphere,
            cube,
            skybox,
            planet,
            star,
            skybox_params,
            planet_params,
            star_params,
            _textures: textures,
            aspect_ratio,
        })
    }

    /// Write this frame's parameters and upload them.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        camera: &CameraState,
        time: f32,
        toggles: SceneToggles,
    ) {
        let frame = FrameParams {
            view: camera.view_matrix(),
            projection: projection(self.aspect_ratio),
            camera_position: camera.position,
            time,
            toggles,
        };

        write_skybox(&mut self.skybox, &self.skybox_params, &frame);
        write_planet(&mut self.planet, &self.planet_params, &frame);
        write_star(&mut self.star, &self.star_params, &frame);

        self.skybox.flush(queue);
        self.planet.flush(queue);
        self.star.flush(queue);
    }

    /// Record every pass in [`SCENE_PASSES`] order.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for pass in &SCENE_PASSES {
            let program = match pass.id {
                PassId::Skybox => &self.skybox,
                PassId::Planet => &self.planet,
                PassId::Star => &self.star,
            };
            let mesh = match pass.mesh {
                MeshId::Cube => &self.cube,
                MeshId::Sphere => &self.sphere,
            };
            program.draw(render_pass, mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shaders")
    }

    #[test]
    fn test_toggles_start_enabled() {
        let toggles = SceneToggles::default();
        assert!(toggles.normal_mapping);
        assert!(toggles.oren_nayar);
    }

    #[test]
    fn test_toggle_flips_one_flag() {
        let mut toggles = SceneToggles::default();
        toggles.apply(Toggle::NormalMapping);
        assert!(!toggles.normal_mapping);
        assert!(toggles.oren_nayar);
        toggles.apply(Toggle::OrenNayar);
        toggles.apply(Toggle::NormalMapping);
        assert!(toggles.normal_mapping);
        assert!(!toggles.oren_nayar);
    }

    #[test]
    fn test_scene_shaders_compile() {
        let dir = shader_dir();
        for pass in &SCENE_PASSES {
            compile_stage_file(&dir.join(pass.vertex_shader), StageKind::Vertex).unwrap();
            compile_stage_file(&dir.join(pass.fragment_shader), StageKind::Fragment).unwrap();
        }
    }

    fn test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }

    #[test]
    fn test_scene_programs_resolve_every_parameter() {
        let Some((device, queue)) = test_device_queue() else {
            return;
        };
        let defaults = DefaultBindings::new(&device, &queue).unwrap();
        let assets = AssetConfig {
            shader_dir: shader_dir(),
            ..AssetConfig::default()
        };
        let format = wgpu::TextureFormat::Bgra8Unorm;

        let skybox = build_program(&device, &defaults, &assets, format, &SKYBOX_PASS).unwrap();
        let planet = build_program(&device, &defaults, &assets, format, &PLANET_PASS).unwrap();
        let star = build_program(&device, &defaults, &assets, format, &STAR_PASS).unwrap();

        for name in ["view", "projection", "skybox"] {
            assert!(skybox.param(name).is_valid(), "skybox lacks {name}");
        }
        for name in [
            "model",
            "normalMtrx",
            "view",
            "projection",
            "cameraPos",
            "daySide",
            "nightSide",
            "roughnessMap",
            "clouds",
            "normalMap",
            "normalMapping",
            "orenNayar",
            "sun.position",
            "sun.emission",
        ] {
            assert!(planet.param(name).is_valid(), "planet lacks {name}");
        }
        for name in [
            "model",
            "normalMtrx",
            "view",
            "projection",
            "cameraPos",
            "time",
            "cubeMap",
        ] {
            assert!(star.param(name).is_valid(), "star lacks {name}");
        }
    }

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        bytemuck::cast_slice(values).to_vec()
    }

    #[test]
    fn test_frame_values_reach_their_parameters() {
        let Some((device, queue)) = test_device_queue() else {
            return;
        };
        let defaults = DefaultBindings::new(&device, &queue).unwrap();
        let assets = AssetConfig {
            shader_dir: shader_dir(),
            ..AssetConfig::default()
        };
        let format = wgpu::TextureFormat::Bgra8Unorm;
        let mut skybox = build_program(&device, &defaults, &assets, format, &SKYBOX_PASS).unwrap();
        let mut planet = build_program(&device, &defaults, &assets, format, &PLANET_PASS).unwrap();
        let mut star = build_program(&device, &defaults, &assets, format, &STAR_PASS).unwrap();
        let skybox_params = SkyboxParams::resolve(&skybox);
        let planet_params = PlanetParams::resolve(&planet);
        let star_params = StarParams::resolve(&star);

        let frame = FrameParams {
            view: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            projection: projection(2.0),
            camera_position: Vec3::new(-4.0, 0.5, 7.0),
            time: 12.5,
            toggles: SceneToggles {
                normal_mapping: true,
                oren_nayar: false,
            },
        };
        write_skybox(&mut skybox, &skybox_params, &frame);
        write_planet(&mut planet, &planet_params, &frame);
        write_star(&mut star, &star_params, &frame);

        let view = f32_bytes(&frame.view.to_cols_array());
        let projection = f32_bytes(&frame.projection.to_cols_array());
        let camera = f32_bytes(&frame.camera_position.to_array());

        assert_eq!(skybox.staged_bytes(skybox_params.view).unwrap(), view);
        assert_eq!(skybox.staged_bytes(skybox_params.projection).unwrap(), projection);

        assert_eq!(planet.staged_bytes(planet_params.view).unwrap(), view);
        assert_eq!(planet.staged_bytes(planet_params.projection).unwrap(), projection);
        assert_eq!(planet.staged_bytes(planet_params.camera_pos).unwrap(), camera);
        assert_eq!(
            planet.staged_bytes(planet_params.model).unwrap(),
            f32_bytes(&planet_model(frame.time).to_cols_array())
        );
        assert_eq!(
            planet.staged_bytes(planet_params.normal_mapping).unwrap(),
            1u32.to_ne_bytes()
        );
        assert_eq!(
            planet.staged_bytes(planet_params.oren_nayar).unwrap(),
            0u32.to_ne_bytes()
        );

        assert_eq!(star.staged_bytes(star_params.view).unwrap(), view);
        assert_eq!(star.staged_bytes(star_params.camera_pos).unwrap(), camera);
        assert_eq!(star.staged_bytes(star_params.time).unwrap(), f32_bytes(&[frame.time]));
        assert_eq!(
            star.staged_bytes(star_params.model).unwrap(),
            f32_bytes(&star_model().to_cols_array())
        );
    }

    #[test]
    fn test_missing_texture_fails_startup() {
        let Some((device, queue)) = test_device_queue() else {
            return;
        };
        let assets = AssetConfig {
            root: PathBuf::from("/nonexistent-orrery-assets"),
            shader_dir: shader_dir(),
            ..AssetConfig::default()
        };
        let result = SceneRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8Unorm,
            &assets,
            16.0 / 9.0,
        );
        assert!(matches!(result, Err(SceneError::Texture(_))));
    }
}
