//! The ordered list of scene passes.

/// Which program a pass draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Skybox,
    Planet,
    Star,
}

/// Which static mesh a pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshId {
    Cube,
    Sphere,
}

/// Fixed state for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassDescriptor {
    pub id: PassId,
    pub label: &'static str,
    pub vertex_shader: &'static str,
    pub fragment_shader: &'static str,
    pub mesh: MeshId,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub cull_mode: Option<wgpu::Face>,
}

pub const SKYBOX_PASS: PassDescriptor = PassDescriptor {
    id: PassId::Skybox,
    label: "skybox",
    vertex_shader: "skybox.vert.wgsl",
    fragment_shader: "skybox.frag.wgsl",
    mesh: MeshId::Cube,
    depth_write: false,
    depth_compare: wgpu::CompareFunction::LessEqual,
    cull_mode: None,
};

pub const PLANET_PASS: PassDescriptor = PassDescriptor {
    id: PassId::Planet,
    label: "planet",
    vertex_shader: "sphere.vert.wgsl",
    fragment_shader: "planet.frag.wgsl",
    mesh: MeshId::Sphere,
    depth_write: true,
    depth_compare: wgpu::CompareFunction::Less,
    cull_mode: Some(wgpu::Face::Back),
};

pub const STAR_PASS: PassDescriptor = PassDescriptor {
    id: PassId::Star,
    label: "star",
    vertex_shader: "sphere.vert.wgsl",
    fragment_shader: "glow_sphere.frag.wgsl",
    mesh: MeshId::Sphere,
    depth_write: true,
    depth_compare: wgpu::CompareFunction::Less,
    cull_mode: Some(wgpu::Face::Back),
};

/// Draw order. The skybox sits at the far plane and must not occlude the
/// spheres, so it is drawn first without writing depth.
pub const SCENE_PASSES: [PassDescriptor; 3] = [SKYBOX_PASS, PLANET_PASS, STAR_PASS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skybox_is_first_without_depth_writes() {
        let first = &SCENE_PASSES[0];
        assert_eq!(first.id, PassId::Skybox);
        assert!(!first.depth_write);
        assert_eq!(first.mesh, MeshId::Cube);
    }

    #[test]
    fn test_later_passes_write_depth() {
        assert!(SCENE_PASSES[1..].iter().all(|pass| pass.depth_write));
    }

    #[test]
    fn test_pass_order() {
        let order: Vec<PassId> = SCENE_PASSES.iter().map(|pass| pass.id).collect();
        assert_eq!(order, vec![PassId::Skybox, PassId::Planet, PassId::Star]);
    }

    #[test]
    fn test_spheres_share_vertex_stage() {
        assert_eq!(PLANET_PASS.vertex_shader, STAR_PASS.vertex_shader);
        assert_ne!(PLANET_PASS.fragment_shader, STAR_PASS.fragment_shader);
    }
}
