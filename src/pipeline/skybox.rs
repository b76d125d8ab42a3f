use crate::core::geometry::Vertex;
use crate::core::math::transform::TransformFactory;
use crate::core::pipeline::Program;
use crate::core::texture::TextureBinding;
use crate::pipeline::passes::SKYBOX_UNIT;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::skybox::SkyboxShader;
use crate::scene::selection::SkyboxKind;
use crate::scene::texture::Cubemap;
use log::info;
use nalgebra::Matrix4;
use std::path::Path;
use std::sync::Arc;

/// Unit cube as a plain triangle list, wound so the inside faces the eye.
#[rustfmt::skip]
const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

/// Draws the environment behind everything else and leaves the selected
/// cubemap on unit 0 for the refraction passes.
pub struct SkyboxRenderer {
    cube: Vec<Vertex>,
    cubemaps: Vec<Arc<Cubemap>>,
    shader: SkyboxShader,
}

impl SkyboxRenderer {
    /// Loads every skybox under `root/<dir_name>`, substituting a gradient
    /// for any that fails.
    pub fn load<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let cubemaps = SkyboxKind::ALL
            .iter()
            .map(|kind| Arc::new(Cubemap::load_or_gradient(root.join(kind.dir_name()))))
            .collect();
        info!("Loaded {} skyboxes from {}", SkyboxKind::ALL.len(), root.display());
        Self::with_cubemaps(cubemaps)
    }

    /// `cubemaps` is indexed by [`SkyboxKind::index`].
    pub fn with_cubemaps(cubemaps: Vec<Arc<Cubemap>>) -> Self {
        let cube = CUBE_POSITIONS
            .iter()
            .map(|&[x, y, z]| Vertex::from_position(x, y, z))
            .collect();
        Self {
            cube,
            cubemaps,
            shader: SkyboxShader::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.cube.len()
    }

    pub fn cubemap(&self, kind: SkyboxKind) -> Option<&Arc<Cubemap>> {
        self.cubemaps.get(kind.index())
    }

    pub fn draw(
        &mut self,
        renderer: &mut Renderer,
        kind: SkyboxKind,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) {
        if let Some(cubemap) = self.cubemap(kind) {
            renderer
                .units
                .bind_unit(SKYBOX_UNIT, TextureBinding::Cubemap(Arc::clone(cubemap)));
        }

        self.shader.set_mat4("view", &TransformFactory::strip_translation(view));
        self.shader.set_mat4("projection", projection);
        self.shader.set_int("skybox", SKYBOX_UNIT as i32);

        let cull_mode = renderer.rasterizer.cull_mode;
        renderer.rasterizer.set_depth_test(false);
        renderer.rasterizer.set_cull_mode(crate::core::rasterizer::CullMode::None);
        renderer.draw_arrays(&self.cube, &self.shader);
        renderer.rasterizer.set_cull_mode(cull_mode);
        renderer.rasterizer.set_depth_test(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rasterizer::CullMode;
    use crate::scene::camera::Camera;
    use nalgebra::Vector3;

    fn skyboxes() -> SkyboxRenderer {
        let cubemaps = SkyboxKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let tint = Vector3::new(i as f32 / 2.0, 0.5, 1.0);
                Arc::new(Cubemap::gradient(kind.label(), tint, Vector3::zeros()))
            })
            .collect();
        SkyboxRenderer::with_cubemaps(cubemaps)
    }

    #[test]
    fn cube_has_thirty_six_vertices() {
        assert_eq!(skyboxes().vertex_count(), 36);
    }

    #[test]
    fn draw_fills_the_screen_and_restores_state() {
        let mut renderer = Renderer::new(16, 16, 1);
        renderer.clear(Vector3::new(0.1, 0.1, 0.1));
        let camera = Camera::default();
        let mut sky = skyboxes();

        sky.draw(
            &mut renderer,
            SkyboxKind::Museum,
            &camera.view_matrix(),
            &camera.projection_matrix(1.0),
        );

        let draw = &renderer.stats().draws[0];
        assert_eq!(draw.program, "skybox");
        assert!(!draw.indexed);
        assert!(!draw.depth_test);
        assert_eq!(draw.triangles, 12);

        assert!(renderer.rasterizer.depth_test);
        assert_eq!(renderer.rasterizer.cull_mode, CullMode::Back);
        assert!(renderer.units.cubemap(SKYBOX_UNIT).is_some());
        assert_ne!(renderer.framebuffer.get_pixel(8, 8), Some(Vector3::new(0.1, 0.1, 0.1)));
    }

    #[test]
    fn unknown_root_falls_back_to_gradients() {
        let sky = SkyboxRenderer::load(std::env::temp_dir().join("refractor-no-such-skybox"));
        for kind in SkyboxKind::ALL {
            assert!(sky.cubemap(kind).is_some());
        }
    }
}
