use crate::core::geometry::Vertex;
use crate::core::math::optics::{base_reflectance, fresnel_schlick, reflect, refract};
use crate::core::math::transform::linearize_depth;
use crate::core::pipeline::{
    FragmentInput, Program, Shader, Transforms, Uniform, UniformError, sampler_unit,
};
use crate::core::texture::TextureUnits;
use crate::pipeline::renderer::CLEAR_DEPTH;
use crate::pipeline::shaders::{SurfaceVarying, normal_matrix};
use nalgebra::{Matrix3, Matrix4, Point2, Vector3, Vector4};

/// Two-interface refraction in image space.
///
/// The view ray refracts into the model at the front surface, travels an
/// estimated distance to the rear surface captured by the backface pass,
/// refracts out through the captured rear normal and is looked up in the
/// environment. The distance is the screen-space thickness d_V, optionally
/// blended with the per-vertex thickness d_N by the ratio of refraction to
/// incidence angle.
///
/// All shading happens in view space.
///
/// Uniforms: `model`, `view`, `projection` (mat4), `modelIOR` (float),
/// `reflectEnable`, `viewSpaceOnly` (bool), `skybox`, `backfaceNormalTex`,
/// `backfaceDepthTex` (sampler units).
pub struct FrontfaceShader {
    transforms: Transforms,
    ior: f32,
    reflect_enable: bool,
    view_space_only: bool,
    skybox_unit: usize,
    normal_unit: usize,
    depth_unit: usize,

    mvp: Matrix4<f32>,
    model_view: Matrix4<f32>,
    view_normal: Matrix3<f32>,
    view_to_world: Matrix3<f32>,
}

impl Default for FrontfaceShader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontfaceShader {
    pub fn new() -> Self {
        Self {
            transforms: Transforms::default(),
            ior: 1.5,
            reflect_enable: true,
            view_space_only: false,
            skybox_unit: 0,
            normal_unit: 1,
            depth_unit: 2,
            mvp: Matrix4::identity(),
            model_view: Matrix4::identity(),
            view_normal: Matrix3::identity(),
            view_to_world: Matrix3::identity(),
        }
    }

    fn refresh(&mut self) {
        self.mvp = self.transforms.mvp();
        self.model_view = self.transforms.model_view();
        self.view_normal = normal_matrix(&self.model_view);

        let view_rotation: Matrix3<f32> =
            self.transforms.view.fixed_view::<3, 3>(0, 0).into_owned();
        self.view_to_world = view_rotation.try_inverse().unwrap_or_else(Matrix3::identity);
    }

    /// Estimated path length inside the model.
    fn thickness(
        &self,
        incident: &Vector3<f32>,
        normal: &Vector3<f32>,
        inner: &Vector3<f32>,
        d_v: f32,
        d_n: f32,
    ) -> f32 {
        if self.view_space_only {
            return d_v;
        }
        let theta_i = (-incident).dot(normal).clamp(-1.0, 1.0).acos();
        let theta_t = (-normal).dot(inner).clamp(-1.0, 1.0).acos();
        // Head-on, the angle ratio tends to 1 / ior.
        let ratio = if theta_i > 1e-4 {
            theta_t / theta_i
        } else {
            1.0 / self.ior
        };
        ratio * d_v + (1.0 - ratio) * d_n
    }

    /// Direction (view space) in which the view ray leaves the model.
    fn exit_direction(
        &self,
        varying: &SurfaceVarying,
        incident: &Vector3<f32>,
        normal: &Vector3<f32>,
        input: &FragmentInput,
        units: &TextureUnits,
    ) -> Vector3<f32> {
        let Some(inner) = refract(incident, normal, 1.0 / self.ior) else {
            return reflect(incident, normal);
        };

        let (Some(back_normals), Some(back_depths)) =
            (units.color(self.normal_unit), units.depth(self.depth_unit))
        else {
            return inner;
        };
        // Nothing captured behind this pixel.
        let Some(back_depth) = back_depths
            .sample_nearest(input.screen_uv)
            .filter(|&d| d < CLEAR_DEPTH)
        else {
            return inner;
        };

        let projection = &self.transforms.projection;
        let d_v = (linearize_depth(back_depth, projection)
            - linearize_depth(input.depth, projection))
        .abs();
        let distance = self.thickness(incident, normal, &inner, d_v, varying.d_n);

        let exit_point = varying.position + inner * distance;
        let clip = projection * exit_point.push(1.0);
        if clip.w <= 1e-6 {
            return inner;
        }
        let uv = Point2::new(
            (clip.x / clip.w + 1.0) * 0.5,
            (1.0 - clip.y / clip.w) * 0.5,
        );

        let Some(exit_normal) = back_normals
            .sample_nearest(uv)
            .and_then(|n| n.try_normalize(1e-6))
        else {
            return inner;
        };

        // The rear normal points out of the model, along the ray.
        let facing = -exit_normal;
        refract(&inner, &facing, self.ior).unwrap_or_else(|| reflect(&inner, &facing))
    }
}

impl Shader for FrontfaceShader {
    type Varying = SurfaceVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let view_pos = self.model_view * vertex.position.to_homogeneous();
        let varying = SurfaceVarying {
            position: view_pos.xyz(),
            normal: self.view_normal * vertex.normal,
            d_n: vertex.d_n,
        };
        (self.mvp * vertex.position.to_homogeneous(), varying)
    }

    fn fragment(
        &self,
        varying: Self::Varying,
        input: &FragmentInput,
        units: &TextureUnits,
    ) -> Vector3<f32> {
        let Some(skybox) = units.cubemap(self.skybox_unit) else {
            return Vector3::zeros();
        };
        let (Some(incident), Some(normal)) = (
            varying.position.try_normalize(1e-12),
            varying.normal.try_normalize(1e-12),
        ) else {
            return Vector3::zeros();
        };

        let exit = self.exit_direction(&varying, &incident, &normal, input, units);
        let transmitted = skybox.sample(&(self.view_to_world * exit));

        if !self.reflect_enable {
            return transmitted;
        }

        let reflected = self.view_to_world * reflect(&incident, &normal);
        let fresnel = fresnel_schlick((-incident).dot(&normal), base_reflectance(self.ior));
        transmitted.lerp(&skybox.sample(&reflected), fresnel)
    }
}

impl Program for FrontfaceShader {
    fn label(&self) -> &'static str {
        "frontface"
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), UniformError> {
        if self.transforms.set(self.label(), name, value)? {
            self.refresh();
            return Ok(());
        }
        let program = self.label();
        match name {
            "modelIOR" => match value {
                Uniform::Float(ior) => self.ior = ior,
                v => return Err(UniformError::mismatch(program, name, "float", v)),
            },
            "reflectEnable" | "viewSpaceOnly" => {
                let Uniform::Bool(flag) = value else {
                    return Err(UniformError::mismatch(program, name, "bool", value));
                };
                if name == "reflectEnable" {
                    self.reflect_enable = flag;
                } else {
                    self.view_space_only = flag;
                }
            }
            "skybox" => self.skybox_unit = sampler_unit(program, name, value)?,
            "backfaceNormalTex" => self.normal_unit = sampler_unit(program, name, value)?,
            "backfaceDepthTex" => self.depth_unit = sampler_unit(program, name, value)?,
            _ => return Err(UniformError::unknown(program, name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::{TransformFactory, ndc_to_window_depth};
    use crate::core::texture::{AttachmentTexture, TextureBinding};
    use crate::scene::texture::Cubemap;
    use std::sync::Arc;

    fn projection() -> Matrix4<f32> {
        TransformFactory::perspective(1.0, 90f32.to_radians(), 0.1, 100.0)
    }

    fn window_depth(z: f32) -> f32 {
        let clip = projection() * Vector4::new(0.0, 0.0, z, 1.0);
        ndc_to_window_depth(clip.z / clip.w)
    }

    fn sky() -> Arc<Cubemap> {
        Arc::new(Cubemap::gradient(
            "test",
            Vector3::new(0.0, 0.2, 1.0),
            Vector3::new(1.0, 0.6, 0.0),
        ))
    }

    /// A slab whose rear face is the plane z = `back_z`, facing away from the eye.
    fn slab_units(back_z: f32) -> TextureUnits {
        let mut units = TextureUnits::new();
        units.bind_unit(0, TextureBinding::Cubemap(sky()));
        units.bind_unit(
            1,
            TextureBinding::Color(Arc::new(AttachmentTexture::new(2, 2, vec![-Vector3::z(); 4]))),
        );
        units.bind_unit(
            2,
            TextureBinding::Depth(Arc::new(AttachmentTexture::new(2, 2, vec![window_depth(back_z); 4]))),
        );
        units
    }

    fn shader() -> FrontfaceShader {
        let mut shader = FrontfaceShader::new();
        shader.set_mat4("projection", &projection());
        shader.set_bool("reflectEnable", false);
        shader.set_float("modelIOR", 1.5);
        shader
    }

    fn front_fragment(p: Vector3<f32>) -> (SurfaceVarying, FragmentInput) {
        let varying = SurfaceVarying {
            position: p,
            normal: Vector3::z(),
            d_n: 1.0,
        };
        let input = FragmentInput {
            screen_uv: Point2::new(0.5, 0.5),
            depth: window_depth(p.z),
        };
        (varying, input)
    }

    #[test]
    fn parallel_slab_leaves_the_ray_direction_unchanged() {
        let shader = shader();
        let units = slab_units(-3.0);
        let (varying, input) = front_fragment(Vector3::new(0.6, 0.3, -2.0));

        let color = shader.fragment(varying, &input, &units);
        let straight = sky().sample(&varying.position.normalize());
        assert!((color - straight).norm() < 1e-3);
    }

    #[test]
    fn without_a_rear_capture_the_ray_bends_once() {
        let shader = shader();
        let mut units = slab_units(-3.0);
        let (varying, input) = front_fragment(Vector3::new(0.6, 0.3, -2.0));

        // Depth at the far plane means nothing was drawn behind this pixel.
        units.bind_unit(
            2,
            TextureBinding::Depth(Arc::new(AttachmentTexture::new(1, 1, vec![CLEAR_DEPTH]))),
        );
        let incident = varying.position.normalize();
        let inner = refract(&incident, &Vector3::z(), 1.0 / 1.5).unwrap();
        let color = shader.fragment(varying, &input, &units);
        assert!((color - sky().sample(&inner)).norm() < 1e-3);
    }

    #[test]
    fn thickness_blends_screen_and_vertex_distances() {
        let mut shader = shader();
        shader.set_float("modelIOR", 2.0);
        let v = -Vector3::z();
        let n = Vector3::z();
        assert!((shader.thickness(&v, &n, &v, 1.0, 3.0) - 2.0).abs() < 1e-6);

        shader.set_bool("viewSpaceOnly", true);
        assert_eq!(shader.thickness(&v, &n, &v, 1.0, 3.0), 1.0);
    }

    #[test]
    fn sampler_uniforms_pick_the_units() {
        let mut shader = FrontfaceShader::new();
        assert!(shader.set_uniform("backfaceDepthTex", Uniform::Int(3)).is_ok());
        assert_eq!(shader.depth_unit, 3);
        assert!(shader.set_uniform("backfaceNormalTex", Uniform::Float(1.0)).is_err());
        assert!(shader.set_uniform("viewSpaceOnly", Uniform::Int(1)).is_err());
        assert!(shader.set_uniform("lightDir", Uniform::Int(1)).is_err());
    }
}
