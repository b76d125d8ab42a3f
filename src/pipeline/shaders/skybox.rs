use crate::core::geometry::Vertex;
use crate::core::pipeline::{
    FragmentInput, Program, Shader, Transforms, Uniform, UniformError, sampler_unit,
};
use crate::core::texture::TextureUnits;
use nalgebra::{Matrix4, Vector3, Vector4};

/// Draws the environment cube around the eye. The cube position doubles as
/// the lookup direction.
///
/// Uniforms: `view` (expected without translation), `projection`, `skybox`.
pub struct SkyboxShader {
    transforms: Transforms,
    view_projection: Matrix4<f32>,
    skybox_unit: usize,
}

impl Default for SkyboxShader {
    fn default() -> Self {
        Self::new()
    }
}

impl SkyboxShader {
    pub fn new() -> Self {
        Self {
            transforms: Transforms::default(),
            view_projection: Matrix4::identity(),
            skybox_unit: 0,
        }
    }
}

impl Shader for SkyboxShader {
    type Varying = Vector3<f32>;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        (
            self.view_projection * vertex.position.to_homogeneous(),
            vertex.position.coords,
        )
    }

    fn fragment(
        &self,
        direction: Self::Varying,
        _input: &FragmentInput,
        units: &TextureUnits,
    ) -> Vector3<f32> {
        units
            .cubemap(self.skybox_unit)
            .map(|sky| sky.sample(&direction))
            .unwrap_or_else(Vector3::zeros)
    }
}

impl Program for SkyboxShader {
    fn label(&self) -> &'static str {
        "skybox"
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), UniformError> {
        if name == "model" {
            return Err(UniformError::unknown(self.label(), name));
        }
        if self.transforms.set(self.label(), name, value)? {
            self.view_projection = self.transforms.projection * self.transforms.view;
            return Ok(());
        }
        match name {
            "skybox" => {
                self.skybox_unit = sampler_unit(self.label(), name, value)?;
                Ok(())
            }
            _ => Err(UniformError::unknown(self.label(), name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_no_model_matrix() {
        let mut shader = SkyboxShader::new();
        assert!(shader.set_uniform("model", Uniform::Mat4(Matrix4::identity())).is_err());
        assert!(shader.set_uniform("skybox", Uniform::Int(0)).is_ok());
    }

    #[test]
    fn passes_cube_positions_through_as_directions() {
        let shader = SkyboxShader::new();
        let (_, dir) = shader.vertex(&Vertex::from_position(1.0, -1.0, 1.0));
        assert_eq!(dir, Vector3::new(1.0, -1.0, 1.0));
    }
}
