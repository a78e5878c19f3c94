//! Static scene geometry: a unit icosphere for the planet and star, and a
//! unit cube for the skybox.
//!
//! Both are emitted as flat triangle lists; the meshes are drawn without an
//! index buffer.

use std::collections::HashMap;

use glam::Vec3;
use orrery_render::{VertexPosition, VertexPositionNormal};

/// Subdivision level of the sphere mesh (5120 triangles).
pub const SPHERE_SUBDIVISIONS: u32 = 4;

/// Vertex count of the skybox cube.
pub const CUBE_VERTEX_COUNT: usize = 36;

/// Generate a unit icosphere as a triangle list with outward normals.
///
/// Every triangle is wound counter-clockwise when seen from outside.
pub fn sphere_vertices(subdivisions: u32) -> Vec<VertexPositionNormal> {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut positions: Vec<Vec3> = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(Vec3::normalize)
    .collect();

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        subdivide(&mut positions, &mut indices);
    }

    let mut vertices = Vec::with_capacity(indices.len());
    for triangle in indices.chunks_exact(3) {
        let [a, mut b, mut c] = [0, 1, 2].map(|i| positions[triangle[i] as usize]);
        let centroid = a + b + c;
        if (b - a).cross(c - a).dot(centroid) < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        for p in [a, b, c] {
            vertices.push(VertexPositionNormal {
                position: p.to_array(),
                normal: p.to_array(),
            });
        }
    }
    vertices
}

/// Split each triangle into four at its edge midpoints, pushed onto the sphere.
fn subdivide(positions: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut new_indices = Vec::with_capacity(indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        *midpoints.entry(key).or_insert_with(|| {
            let mid = (positions[a as usize] + positions[b as usize]).normalize();
            positions.push(mid);
            (positions.len() - 1) as u32
        })
    };

    for triangle in indices.chunks_exact(3) {
        let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);

        new_indices.extend_from_slice(&[a, ab, ca]);
        new_indices.extend_from_slice(&[b, bc, ab]);
        new_indices.extend_from_slice(&[c, ca, bc]);
        new_indices.extend_from_slice(&[ab, bc, ca]);
    }

    *indices = new_indices;
}

/// Generate the 36-vertex cube spanning [-1, 1] on every axis.
pub fn cube_vertices() -> Vec<VertexPosition> {
    const QUAD: [(f32, f32); 6] = [
        (-1.0, -1.0),
        (1.0, -1.0),
        (1.0, 1.0),
        (-1.0, -1.0),
        (1.0, 1.0),
        (-1.0, 1.0),
    ];

    let mut vertices = Vec::with_capacity(CUBE_VERTEX_COUNT);
    for axis in 0..3 {
        for side in [1.0, -1.0] {
            for (u, v) in QUAD {
                let mut position = [0.0; 3];
                position[axis] = side;
                position[(axis + 1) % 3] = u;
                position[(axis + 2) % 3] = v;
                vertices.push(VertexPosition { position });
            }
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_triangle_count() {
        let vertices = sphere_vertices(SPHERE_SUBDIVISIONS);
        assert_eq!(vertices.len(), 20 * 4usize.pow(SPHERE_SUBDIVISIONS) * 3);
    }

    #[test]
    fn test_sphere_vertices_on_unit_sphere() {
        for vertex in sphere_vertices(3) {
            let length = Vec3::from_array(vertex.position).length();
            assert!(
                (length - 1.0).abs() < 1e-5,
                "sphere vertex not on unit sphere: length = {length}"
            );
            assert_eq!(vertex.position, vertex.normal);
        }
    }

    #[test]
    fn test_sphere_winding_faces_outward() {
        let vertices = sphere_vertices(2);
        for triangle in vertices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(triangle[i].position));
            let facing = (b - a).cross(c - a).dot(a + b + c);
            assert!(facing > 0.0, "triangle wound inward");
        }
    }

    #[test]
    fn test_cube_has_36_vertices_on_faces() {
        let vertices = cube_vertices();
        assert_eq!(vertices.len(), CUBE_VERTEX_COUNT);
        for vertex in &vertices {
            assert!(vertex.position.iter().all(|c| c.abs() <= 1.0));
            assert!(vertex.position.iter().any(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn test_cube_covers_every_face() {
        let vertices = cube_vertices();
        for axis in 0..3 {
            for side in [1.0, -1.0] {
                let on_face = vertices
                    .iter()
                    .filter(|v| v.position[axis] == side)
                    .count();
                assert!(on_face >= 6, "face {axis}/{side} missing");
            }
        }
    }
}
