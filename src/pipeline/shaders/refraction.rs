use crate::core::geometry::Vertex;
use crate::core::math::optics::{base_reflectance, fresnel_schlick, reflect, refract};
use crate::core::pipeline::{
    FragmentInput, Program, Shader, Transforms, Uniform, UniformError, sampler_unit,
};
use crate::core::texture::TextureUnits;
use crate::pipeline::shaders::{SurfaceVarying, normal_matrix};
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// Single-interface refraction: the view ray bends once entering the model
/// and is looked up in the environment directly.
///
/// Uniforms: `model`, `view`, `projection` (mat4), `modelIOR` (float),
/// `reflectEnable` (bool), `skybox` (sampler unit).
pub struct RefractionShader {
    transforms: Transforms,
    ior: f32,
    reflect_enable: bool,
    skybox_unit: usize,

    // Derived from the matrices.
    mvp: Matrix4<f32>,
    world_normal: Matrix3<f32>,
    camera_pos: Vector3<f32>,
}

impl Default for RefractionShader {
    fn default() -> Self {
        Self::new()
    }
}

impl RefractionShader {
    pub fn new() -> Self {
        Self {
            transforms: Transforms::default(),
            ior: 1.5,
            reflect_enable: true,
            skybox_unit: 0,
            mvp: Matrix4::identity(),
            world_normal: Matrix3::identity(),
            camera_pos: Vector3::zeros(),
        }
    }

    fn refresh(&mut self) {
        self.mvp = self.transforms.mvp();
        self.world_normal = normal_matrix(&self.transforms.model);
        self.camera_pos = self
            .transforms
            .view
            .try_inverse()
            .map(|inv| Vector3::new(inv[(0, 3)], inv[(1, 3)], inv[(2, 3)]))
            .unwrap_or_else(Vector3::zeros);
    }
}

impl Shader for RefractionShader {
    type Varying = SurfaceVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let world = self.transforms.model * vertex.position.to_homogeneous();
        let varying = SurfaceVarying {
            position: world.xyz(),
            normal: self.world_normal * vertex.normal,
            d_n: vertex.d_n,
        };
        (self.mvp * vertex.position.to_homogeneous(), varying)
    }

    fn fragment(
        &self,
        varying: Self::Varying,
        _input: &FragmentInput,
        units: &TextureUnits,
    ) -> Vector3<f32> {
        let Some(skybox) = units.cubemap(self.skybox_unit) else {
            return Vector3::zeros();
        };

        let incident = (varying.position - self.camera_pos).normalize();
        let normal = varying.normal.normalize();

        let reflected = reflect(&incident, &normal);
        let refracted = refract(&incident, &normal, 1.0 / self.ior).unwrap_or(reflected);
        let transmitted = skybox.sample(&refracted);

        if !self.reflect_enable {
            return transmitted;
        }

        let fresnel = fresnel_schlick((-incident).dot(&normal), base_reflectance(self.ior));
        transmitted.lerp(&skybox.sample(&reflected), fresnel)
    }
}

impl Program for RefractionShader {
    fn label(&self) -> &'static str {
        "refraction"
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), UniformError> {
        if self.transforms.set(self.label(), name, value)? {
            self.refresh();
            return Ok(());
        }
        match (name, value) {
            ("modelIOR", Uniform::Float(ior)) => self.ior = ior,
            ("reflectEnable", Uniform::Bool(enable)) => self.reflect_enable = enable,
            ("skybox", v) => self.skybox_unit = sampler_unit(self.label(), name, v)?,
            ("modelIOR", v) => return Err(UniformError::mismatch(self.label(), name, "float", v)),
            ("reflectEnable", v) => {
                return Err(UniformError::mismatch(self.label(), name, "bool", v));
            }
            _ => return Err(UniformError::unknown(self.label(), name)),
        }
        Ok(())
    }
}
