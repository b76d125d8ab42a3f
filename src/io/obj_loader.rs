use crate::core::geometry::Vertex;
use crate::scene::d_n::{MAX_RAY_DISTANCE, compute_model_d_n};
use crate::scene::mesh::{Mesh, compute_smooth_normals};
use crate::scene::model::Model;
use crate::scene::utils::normalize_and_center_model;
use log::{debug, error, info, warn};
use nalgebra::{Point3, Vector3};
use std::path::Path;

/// Post-processing applied after an OBJ file is parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelLoadOptions {
    /// Center and scale into the unit cube.
    pub normalize: bool,
    /// Ray-cast d_N when the file has no vertex colors.
    pub compute_missing_d_n: bool,
}

/// Loads an OBJ file as a model with one mesh per sub-model.
///
/// Never fails: a missing or unparsable file is logged and yields an empty
/// model, which draws nothing.
///
/// d_N is read from the red channel of the vertex colors (`v x y z r g b`).
pub fn load_model<P: AsRef<Path>>(path: P, name: &str, options: ModelLoadOptions) -> Model {
    let path = path.as_ref();
    info!("Loading OBJ file: {}", path.display());

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // One index stream for position, normal and color
        ..Default::default()
    };

    let (obj_models, _materials) = match tobj::load_obj(path, &load_options) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to load model '{}' from {}: {}", name, path.display(), e);
            return Model::empty(name);
        }
    };

    let mut has_d_n = true;
    let mut meshes = Vec::with_capacity(obj_models.len());
    for obj in obj_models {
        let (mesh, colored) = convert_mesh(obj);
        has_d_n &= colored;
        if mesh.triangle_count() > 0 {
            meshes.push(mesh);
        } else {
            debug!("Skipping empty sub-model '{}'", mesh.name);
        }
    }

    let mut model = Model::new(name, meshes);
    if model.is_empty() {
        warn!("Model '{}' has no triangles", name);
        return model;
    }

    if options.normalize {
        let (center, scale) = normalize_and_center_model(&mut model);
        debug!(
            "Model '{}' normalized. Center: {:?}, Scale: {:.4}",
            name, center, scale
        );
    }

    if !has_d_n {
        if options.compute_missing_d_n {
            info!("Model '{}' has no d_N colors, computing by ray casting", name);
            compute_model_d_n(&mut model, MAX_RAY_DISTANCE);
        } else {
            warn!("Model '{}' has no d_N colors. Using 0.0.", name);
        }
    }

    model.log_stats();
    model
}

/// Returns the mesh and whether its vertices carried colors.
fn convert_mesh(obj: tobj::Model) -> (Mesh, bool) {
    let src = &obj.mesh;
    let positions: Vec<Point3<f32>> = src
        .positions
        .chunks_exact(3)
        .map(|p| Point3::new(p[0], p[1], p[2]))
        .collect();

    let has_normals = src.normals.len() == src.positions.len();
    let normals: Vec<Vector3<f32>> = if has_normals {
        src.normals
            .chunks_exact(3)
            .map(|n| Vector3::new(n[0], n[1], n[2]))
            .collect()
    } else {
        debug!("Mesh '{}' has no normals, computing smooth normals", obj.name);
        compute_smooth_normals(&positions, &src.indices)
    };

    let has_colors = src.vertex_color.len() == src.positions.len();
    let vertices = positions
        .iter()
        .zip(&normals)
        .enumerate()
        .map(|(i, (&position, &normal))| {
            let d_n = if has_colors { src.vertex_color[i * 3] } else { 0.0 };
            Vertex::new(position, normal, d_n)
        })
        .collect();

    (Mesh::new(obj.name, vertices, src.indices.clone()), has_colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_obj(file_name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(file_name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_an_empty_model() {
        let model = load_model("/no/such/model.obj", "Ghost", ModelLoadOptions::default());
        assert!(model.is_empty());
        assert_eq!(model.name, "Ghost");
    }

    #[test]
    fn vertex_color_red_channel_is_d_n() {
        let path = write_obj(
            "refractor_colored_triangle.obj",
            "o tri\n\
             v 0 0 0 0.25 0.5 0.5\n\
             v 1 0 0 0.50 0.5 0.5\n\
             v 0 1 0 0.75 0.5 0.5\n\
             f 1 2 3\n",
        );
        let model = load_model(&path, "Tri", ModelLoadOptions::default());
        fs::remove_file(&path).ok();

        assert_eq!(model.stats().meshes, 1);
        let mesh = &model.meshes[0];
        let d_n: Vec<f32> = mesh.vertices.iter().map(|v| v.d_n).collect();
        assert_eq!(d_n, vec![0.25, 0.5, 0.75]);
        // No normals in the file: computed from the face.
        for v in &mesh.vertices {
            assert!((v.normal - Vector3::z()).norm() < 1e-5);
        }
    }

    #[test]
    fn each_object_becomes_a_mesh() {
        let path = write_obj(
            "refractor_two_objects.obj",
            "o a\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             f 1 2 3\n\
             o b\n\
             v 0 0 1\nv 1 0 1\nv 0 1 1\n\
             f 4 5 6\n",
        );
        let model = load_model(
            &path,
            "Pair",
            ModelLoadOptions {
                normalize: true,
                compute_missing_d_n: false,
            },
        );
        fs::remove_file(&path).ok();

        let stats = model.stats();
        assert_eq!(stats.meshes, 2);
        assert_eq!(stats.triangles, 2);
        assert!(model.meshes.iter().all(|m| m.vertices.iter().all(|v| v.d_n == 0.0)));
    }
}
