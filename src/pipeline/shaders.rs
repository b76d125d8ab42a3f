pub mod backface;
pub mod frontface;
pub mod refraction;
pub mod skybox;

use crate::core::pipeline::Interpolatable;
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::ops::{Add, Mul};

/// Surface attributes shared by the mesh programs. The space of `position`
/// and `normal` depends on the program.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceVarying {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub d_n: f32,
}

impl Add for SurfaceVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            position: self.position + other.position,
            normal: self.normal + other.normal,
            d_n: self.d_n + other.d_n,
        }
    }
}

impl Mul<f32> for SurfaceVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            position: self.position * scalar,
            normal: self.normal * scalar,
            d_n: self.d_n * scalar,
        }
    }
}

impl Interpolatable for SurfaceVarying {}

/// Inverse-transpose of the upper 3x3 of `m`, for transforming normals.
/// Falls back to the plain 3x3 if `m` is singular.
pub(crate) fn normal_matrix(m: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::TransformFactory;

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_scaling() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0))
            * TransformFactory::rotation_y(0.4);
        let tangent = Vector3::new(1.0, 1.0, 0.0);
        let normal = Vector3::new(1.0, -1.0, 0.0);

        let t = m.fixed_view::<3, 3>(0, 0) * tangent;
        let n = normal_matrix(&m) * normal;
        assert!(t.dot(&n).abs() < 1e-5);
    }
}
