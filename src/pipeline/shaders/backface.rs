use crate::core::geometry::Vertex;
use crate::core::pipeline::{FragmentInput, Program, Shader, Transforms, Uniform, UniformError};
use crate::core::texture::TextureUnits;
use crate::pipeline::shaders::{SurfaceVarying, normal_matrix};
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// Captures the rear surface of the model: writes its view-space normal to
/// the color attachment while the rasterizer writes its depth.
///
/// Uniforms: `model`, `view`, `projection`.
pub struct BackfaceShader {
    transforms: Transforms,
    mvp: Matrix4<f32>,
    view_normal: Matrix3<f32>,
}

impl Default for BackfaceShader {
    fn default() -> Self {
        Self::new()
    }
}

impl BackfaceShader {
    pub fn new() -> Self {
        Self {
            transforms: Transforms::default(),
            mvp: Matrix4::identity(),
            view_normal: Matrix3::identity(),
        }
    }
}

impl Shader for BackfaceShader {
    type Varying = SurfaceVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let varying = SurfaceVarying {
            position: Vector3::zeros(),
            normal: self.view_normal * vertex.normal,
            d_n: 0.0,
        };
        (self.mvp * vertex.position.to_homogeneous(), varying)
    }

    fn fragment(
        &self,
        varying: Self::Varying,
        _input: &FragmentInput,
        _units: &TextureUnits,
    ) -> Vector3<f32> {
        varying.normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
    }
}

impl Program for BackfaceShader {
    fn label(&self) -> &'static str {
        "backface"
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), UniformError> {
        if self.transforms.set(self.label(), name, value)? {
            self.mvp = self.transforms.mvp();
            self.view_normal = normal_matrix(&self.transforms.model_view());
            Ok(())
        } else {
            Err(UniformError::unknown(self.label(), name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::TransformFactory;
    use nalgebra::Point2;

    #[test]
    fn writes_view_space_normals() {
        let mut shader = BackfaceShader::new();
        // A camera turned 90 degrees sees world +X as view -Z.
        shader.set_mat4("view", &TransformFactory::rotation_y(std::f32::consts::FRAC_PI_2));

        let vertex = Vertex::new(nalgebra::Point3::origin(), Vector3::x(), 0.3);
        let (_, varying) = shader.vertex(&vertex);
        let input = FragmentInput {
            screen_uv: Point2::new(0.5, 0.5),
            depth: 0.5,
        };
        let normal = shader.fragment(varying, &input, &TextureUnits::new());
        assert!((normal - (-Vector3::z())).norm() < 1e-5);
    }

    #[test]
    fn only_matrices_are_accepted() {
        let mut shader = BackfaceShader::new();
        assert!(shader.set_uniform("modelIOR", Uniform::Float(1.5)).is_err());
        assert!(shader.set_uniform("projection", Uniform::Mat4(Matrix4::identity())).is_ok());
    }
}
