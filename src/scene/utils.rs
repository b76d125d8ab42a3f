use crate::scene::model::Model;
use nalgebra::Point3;

/// Analyzes the model's bounding box and transforms all vertices
/// so that the model is centered at (0,0,0) and fits within [-0.9, 0.9].
///
/// d_N is a length, so it is scaled by the same factor.
/// Returns the original center and the scaling factor used.
pub fn normalize_and_center_model(model: &mut Model) -> (Point3<f32>, f32) {
    let mut positions = model
        .meshes
        .iter()
        .flat_map(|m| m.vertices.iter().map(|v| v.position));

    let Some(first) = positions.next() else {
        return (Point3::origin(), 1.0);
    };

    let (min_bound, max_bound) = positions.fold((first, first), |(lo, hi), p| {
        (lo.inf(&p), hi.sup(&p))
    });

    let center = nalgebra::center(&min_bound, &max_bound);
    let extent = max_bound - min_bound;
    let max_dimension = extent.x.max(extent.y).max(extent.z);

    // Scale to fit in [-1, 1] (size 2.0), with a little padding (1.8)
    let scale_factor = if max_dimension > 1e-6 {
        1.8 / max_dimension
    } else {
        1.0
    };

    for mesh in &mut model.meshes {
        for vertex in &mut mesh.vertices {
            vertex.position = Point3::from((vertex.position - center) * scale_factor);
            vertex.d_n *= scale_factor;
        }
    }

    (center, scale_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::Mesh;
    use nalgebra::Vector3;

    #[test]
    fn fits_the_model_and_scales_thickness() {
        let mut sphere = Mesh::create_uv_sphere(4.0, 6, 8);
        for v in &mut sphere.vertices {
            v.position += Vector3::new(10.0, 0.0, 0.0);
            v.d_n = 8.0;
        }
        let mut model = Model::new("offset sphere", vec![sphere]);

        let (center, scale) = normalize_and_center_model(&mut model);
        assert!((center - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-4);
        assert!((scale - 1.8 / 8.0).abs() < 1e-6);

        for v in &model.meshes[0].vertices {
            assert!(v.position.coords.amax() <= 0.9 + 1e-5);
            assert!((v.d_n - 1.8).abs() < 1e-5);
        }
    }

    #[test]
    fn empty_models_are_left_alone() {
        let mut model = Model::empty("nothing");
        assert_eq!(normalize_and_center_model(&mut model), (Point3::origin(), 1.0));
    }
}
