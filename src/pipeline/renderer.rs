use crate::core::color::{aces_tone_mapping, to_rgba8};
use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::Vertex;
use crate::core::pipeline::{Program, Shader};
use crate::core::rasterizer::{CullMode, Rasterizer};
use crate::core::texture::TextureUnits;
use crate::scene::model::Model;
use nalgebra::{Vector3, Vector4};
use rayon::prelude::*;

/// Window depth every clear resets to.
pub const CLEAR_DEPTH: f32 = 1.0;

/// Which framebuffer a draw went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Default,
    Offscreen,
}

/// One submitted draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: &'static str,
    pub target: TargetKind,
    pub cull_mode: CullMode,
    pub depth_test: bool,
    pub indexed: bool,
    pub triangles: usize,
}

/// Draw calls submitted since the last `begin_frame`.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub draws: Vec<DrawRecord>,
}

impl FrameStats {
    pub fn draw_calls(&self) -> usize {
        self.draws.len()
    }

    pub fn triangles(&self) -> usize {
        self.draws.iter().map(|d| d.triangles).sum()
    }
}

/// Display transform applied when the color attachment is read out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcess {
    pub exposure: f32,
    pub use_aces: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            use_aces: false,
        }
    }
}

/// The high-level renderer that orchestrates the pipeline stages.
///
/// Owns the default framebuffer, the fixed-function state and the texture
/// unit table. Off-screen targets are drawn into through
/// [`RenderTarget::bind`](crate::pipeline::render_target::RenderTarget::bind).
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
    pub units: TextureUnits,
    pub(crate) bound_target: TargetKind,
    stats: FrameStats,
}

impl Renderer {
    /// Creates a new renderer.
    /// sample_count: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
            units: TextureUnits::new(),
            bound_target: TargetKind::Default,
            stats: FrameStats::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height
    }

    pub fn bound_target(&self) -> TargetKind {
        self.bound_target
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Forgets the draw calls of the previous frame.
    pub fn begin_frame(&mut self) {
        self.stats.draws.clear();
    }

    /// Recreates the default framebuffer when the size changed.
    /// Returns true if it did.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if self.framebuffer.width == width && self.framebuffer.height == height {
            return false;
        }
        self.framebuffer = FrameBuffer::new(width, height, self.framebuffer.sample_count);
        true
    }

    /// Clears the default framebuffer.
    pub fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color, CLEAR_DEPTH);
    }

    /// Draws a complete model, one indexed draw per mesh, into the default
    /// framebuffer. The program's uniforms must already be set.
    pub fn draw_model<S: Shader + Program>(&mut self, model: &Model, shader: &S) {
        self.draw_model_into(None, model, shader);
    }

    /// Draws `vertices` as a triangle list without an index buffer.
    pub fn draw_arrays<S: Shader + Program>(&mut self, vertices: &[Vertex], shader: &S) {
        let clip = Self::run_vertex_stage(vertices, shader);
        let triangles = vertices.len() / 3;
        for t in 0..triangles {
            let [a, b, c] = [3 * t, 3 * t + 1, 3 * t + 2];
            self.rasterizer.rasterize_triangle(
                &self.framebuffer,
                shader,
                &self.units,
                &[clip[a].0, clip[b].0, clip[c].0],
                &[clip[a].1, clip[b].1, clip[c].1],
            );
        }
        self.record(shader.label(), TargetKind::Default, false, triangles);
    }

    /// `target` is `None` for the default framebuffer.
    pub(crate) fn draw_model_into<S: Shader + Program>(
        &mut self,
        target: Option<&FrameBuffer>,
        model: &Model,
        shader: &S,
    ) {
        let kind = if target.is_some() {
            TargetKind::Offscreen
        } else {
            TargetKind::Default
        };
        let framebuffer = target.unwrap_or(&self.framebuffer);

        let mut submitted = Vec::with_capacity(model.meshes.len());
        for mesh in &model.meshes {
            // Vertex processing runs once per vertex, then triangles are assembled.
            let clip = Self::run_vertex_stage(&mesh.vertices, shader);

            let mut triangles = 0;
            for [i0, i1, i2] in mesh.triangles() {
                self.rasterizer.rasterize_triangle(
                    framebuffer,
                    shader,
                    &self.units,
                    &[clip[i0].0, clip[i1].0, clip[i2].0],
                    &[clip[i0].1, clip[i1].1, clip[i2].1],
                );
                triangles += 1;
            }
            submitted.push(triangles);
        }

        for triangles in submitted {
            self.record(shader.label(), kind, true, triangles);
        }
    }

    fn run_vertex_stage<S: Shader>(vertices: &[Vertex], shader: &S) -> Vec<(Vector4<f32>, S::Varying)> {
        vertices.par_iter().map(|v| shader.vertex(v)).collect()
    }

    fn record(&mut self, program: &'static str, target: TargetKind, indexed: bool, triangles: usize) {
        self.stats.draws.push(DrawRecord {
            program,
            target,
            cull_mode: self.rasterizer.cull_mode,
            depth_test: self.rasterizer.depth_test,
            indexed,
            triangles,
        });
        // Every draw leaves unit 0 active.
        self.units.active_texture(0);
    }

    /// Post-processing: Exposure -> Tone Mapping -> Gamma Correction -> RGBA8,
    /// row-major, top row first.
    pub fn post_process_to_rgba(&self, post: &PostProcess) -> Vec<u8> {
        let fb = &self.framebuffer;
        let mut rgba = vec![0u8; fb.width * fb.height * 4];
        if fb.width == 0 {
            return rgba;
        }

        rgba.par_chunks_mut(fb.width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                    let Some(color) = fb.get_pixel(x, y) else {
                        continue;
                    };
                    let exposed = color * post.exposure;
                    let mapped = if post.use_aces {
                        aces_tone_mapping(exposed)
                    } else {
                        exposed
                    };
                    pixel.copy_from_slice(&to_rgba8(mapped));
                }
            });
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{Uniform, UniformError};
    use crate::scene::mesh::Mesh;

    /// Passes positions straight through as clip coordinates, paints white.
    struct FlatShader;

    impl Shader for FlatShader {
        type Varying = Vector3<f32>;

        fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
            (vertex.position.to_homogeneous(), Vector3::zeros())
        }

        fn fragment(
            &self,
            _varying: Self::Varying,
            _input: &crate::core::pipeline::FragmentInput,
            _units: &TextureUnits,
        ) -> Vector3<f32> {
            Vector3::new(1.0, 1.0, 1.0)
        }
    }

    impl Program for FlatShader {
        fn label(&self) -> &'static str {
            "flat"
        }

        fn set_uniform(&mut self, name: &str, _value: Uniform) -> Result<(), UniformError> {
            Err(UniformError::unknown(self.label(), name))
        }
    }

    #[test]
    fn empty_model_issues_no_draw_calls() {
        let mut renderer = Renderer::new(8, 8, 1);
        renderer.draw_model(&Model::empty("none"), &FlatShader);
        assert_eq!(renderer.stats().draw_calls(), 0);
    }

    #[test]
    fn one_draw_per_mesh_and_unit_zero_left_active() {
        let mut renderer = Renderer::new(16, 16, 1);
        renderer.units.active_texture(2);
        let model = Model::new(
            "two triangles",
            vec![Mesh::create_test_triangle(), Mesh::create_test_triangle()],
        );
        renderer.draw_model(&model, &FlatShader);

        let stats = renderer.stats();
        assert_eq!(stats.draw_calls(), 2);
        assert!(stats.draws.iter().all(|d| d.indexed && d.target == TargetKind::Default));
        assert_eq!(stats.triangles(), 2);
        assert_eq!(renderer.units.active_unit(), 0);

        renderer.begin_frame();
        assert_eq!(renderer.stats().draw_calls(), 0);
    }

    #[test]
    fn front_facing_triangle_covers_the_center() {
        let mut renderer = Renderer::new(16, 16, 1);
        renderer.clear(Vector3::zeros());
        renderer.draw_model(&Model::new("tri", vec![Mesh::create_test_triangle()]), &FlatShader);
        assert_eq!(renderer.framebuffer.get_pixel(8, 8), Some(Vector3::new(1.0, 1.0, 1.0)));

        renderer.clear(Vector3::zeros());
        renderer.rasterizer.set_cull_mode(CullMode::Front);
        renderer.draw_model(&Model::new("tri", vec![Mesh::create_test_triangle()]), &FlatShader);
        assert_eq!(renderer.framebuffer.get_pixel(8, 8), Some(Vector3::zeros()));
    }

    #[test]
    fn draw_arrays_is_not_indexed() {
        let mut renderer = Renderer::new(4, 4, 1);
        let tri = Mesh::create_test_triangle().vertices;
        renderer.draw_arrays(&tri, &FlatShader);
        assert!(!renderer.stats().draws[0].indexed);
        assert_eq!(renderer.stats().draws[0].triangles, 1);
    }

    #[test]
    fn resize_only_when_the_size_changes() {
        let mut renderer = Renderer::new(4, 4, 2);
        assert!(!renderer.resize(4, 4));
        assert!(renderer.resize(6, 3));
        assert_eq!((renderer.width(), renderer.height()), (6, 3));
        assert_eq!(renderer.framebuffer.sample_count, 2);
    }

    #[test]
    fn post_process_writes_opaque_srgb() {
        let mut renderer = Renderer::new(2, 1, 1);
        renderer.clear(Vector3::new(1.0, 0.0, 0.0));
        let rgba = renderer.post_process_to_rgba(&PostProcess::default());
        assert_eq!(rgba, vec![255, 0, 0, 255, 255, 0, 0, 255]);
    }
}
