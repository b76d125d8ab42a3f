use crate::core::math::intersect::ray_triangle;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use log::info;
use nalgebra::Point3;
use rayon::prelude::*;
use std::time::Instant;

/// Rays longer than this count as misses.
pub const MAX_RAY_DISTANCE: f32 = 1000.0;

/// Fills `d_n` of every vertex with the distance through the mesh along the
/// inverted normal: the farthest hit of a ray cast from the vertex along
/// `-normal`, or 0.0 when nothing is hit within `max_distance`.
///
/// Brute force over all triangles, parallel over vertices.
pub fn compute_mesh_d_n(mesh: &mut Mesh, max_distance: f32) {
    let triangles: Vec<[Point3<f32>; 3]> = mesh
        .triangles()
        .map(|[a, b, c]| {
            [
                mesh.vertices[a].position,
                mesh.vertices[b].position,
                mesh.vertices[c].position,
            ]
        })
        .collect();

    mesh.vertices.par_iter_mut().for_each(|vertex| {
        let Some(dir) = (-vertex.normal).try_normalize(1e-12) else {
            vertex.d_n = 0.0;
            return;
        };

        vertex.d_n = triangles
            .iter()
            .filter_map(|[v0, v1, v2]| ray_triangle(&vertex.position, &dir, v0, v1, v2))
            .filter(|&t| t <= max_distance)
            .fold(0.0, f32::max);
    });
}

/// Runs [`compute_mesh_d_n`] on every mesh of `model`.
pub fn compute_model_d_n(model: &mut Model, max_distance: f32) {
    let start = Instant::now();
    for mesh in &mut model.meshes {
        compute_mesh_d_n(mesh, max_distance);
    }
    info!(
        "Computed d_N for '{}' in {:.2?}",
        model.name,
        start.elapsed()
    );
}
