use crate::core::pipeline::{Program, Transforms};
use crate::core::rasterizer::CullMode;
use crate::core::texture::TextureBinding;
use crate::pipeline::render_target::RenderTarget;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::backface::BackfaceShader;
use crate::pipeline::shaders::frontface::FrontfaceShader;
use crate::pipeline::shaders::refraction::RefractionShader;
use crate::scene::model::Model;
use crate::scene::selection::{RefractionMethod, Selection};
use log::{debug, error};

/// Texture unit the skybox cubemap is bound to by the skybox pass.
pub const SKYBOX_UNIT: usize = 0;
pub const BACKFACE_NORMAL_UNIT: usize = 1;
pub const BACKFACE_DEPTH_UNIT: usize = 2;

/// Where the refraction pipeline is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    OneSurfacePass,
    TwoSurfaceBackfacePass,
    TwoSurfaceFrontfacePass,
}

impl PassState {
    pub fn can_transition_to(self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (Idle, OneSurfacePass)
                | (OneSurfacePass, Idle)
                | (Idle, TwoSurfaceBackfacePass)
                | (TwoSurfaceBackfacePass, TwoSurfaceFrontfacePass)
                | (TwoSurfaceFrontfacePass, Idle)
        )
    }
}

/// Draws the selected model with the selected refraction technique.
///
/// Expects the skybox cubemap on unit 0 (the skybox pass leaves it there).
pub struct RefractionPipeline {
    refraction: RefractionShader,
    backface: BackfaceShader,
    frontface: FrontfaceShader,
    backface_target: RenderTarget,
    state: PassState,
}

impl RefractionPipeline {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            refraction: RefractionShader::new(),
            backface: BackfaceShader::new(),
            frontface: FrontfaceShader::new(),
            backface_target: RenderTarget::new(width, height),
            state: PassState::Idle,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn backface_target(&self) -> &RenderTarget {
        &self.backface_target
    }

    /// Keeps the backface target the size of the viewport.
    pub fn ensure_target_size(&mut self, width: usize, height: usize) {
        if self.backface_target.ensure_size(width, height) {
            debug!("Backface target resized to {}x{}", width, height);
        }
    }

    fn transition(&mut self, next: PassState) {
        if self.state.can_transition_to(next) {
            debug!("Refraction pass: {:?} -> {:?}", self.state, next);
        } else {
            error!("Illegal refraction pass transition {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Runs the passes for one frame. Always returns to `Idle`.
    pub fn render(
        &mut self,
        renderer: &mut Renderer,
        model: &Model,
        selection: &Selection,
        transforms: &Transforms,
    ) {
        match selection.refraction {
            RefractionMethod::OneSurface => {
                self.transition(PassState::OneSurfacePass);
                self.one_surface(renderer, model, selection, transforms);
            }
            RefractionMethod::TwoSurfaces => {
                self.transition(PassState::TwoSurfaceBackfacePass);
                self.backface_pass(renderer, model, transforms);
                self.transition(PassState::TwoSurfaceFrontfacePass);
                self.frontface_pass(renderer, model, selection, transforms);
            }
        }
        self.transition(PassState::Idle);
    }

    fn one_surface(
        &mut self,
        renderer: &mut Renderer,
        model: &Model,
        selection: &Selection,
        transforms: &Transforms,
    ) {
        let shader = &mut self.refraction;
        set_transforms(shader, transforms);
        shader.set_float("modelIOR", selection.ior);
        shader.set_bool("reflectEnable", selection.reflect);
        shader.set_int("skybox", SKYBOX_UNIT as i32);
        renderer.draw_model(model, shader);
    }

    /// Captures the rear surface into the backface target.
    fn backface_pass(&mut self, renderer: &mut Renderer, model: &Model, transforms: &Transforms) {
        set_transforms(&mut self.backface, transforms);

        let mut bound = self.backface_target.bind(renderer);
        bound.clear();
        bound.renderer().rasterizer.set_cull_mode(CullMode::Front);
        bound.draw_model(model, &self.backface);
        bound.renderer().rasterizer.set_cull_mode(CullMode::Back);
    }

    fn frontface_pass(
        &mut self,
        renderer: &mut Renderer,
        model: &Model,
        selection: &Selection,
        transforms: &Transforms,
    ) {
        renderer.units.bind_unit(
            BACKFACE_NORMAL_UNIT,
            TextureBinding::Color(self.backface_target.normal_texture()),
        );
        renderer.units.bind_unit(
            BACKFACE_DEPTH_UNIT,
            TextureBinding::Depth(self.backface_target.depth_texture()),
        );

        let shader = &mut self.frontface;
        set_transforms(shader, transforms);
        shader.set_float("modelIOR", selection.ior);
        shader.set_bool("reflectEnable", selection.reflect);
        shader.set_bool("viewSpaceOnly", selection.dv_only);
        shader.set_int("skybox", SKYBOX_UNIT as i32);
        shader.set_int("backfaceNormalTex", BACKFACE_NORMAL_UNIT as i32);
        shader.set_int("backfaceDepthTex", BACKFACE_DEPTH_UNIT as i32);
        renderer.draw_model(model, shader);
    }
}

fn set_transforms<P: Program>(program: &mut P, transforms: &Transforms) {
    program.set_mat4("model", &transforms.model);
    program.set_mat4("view", &transforms.view);
    program.set_mat4("projection", &transforms.projection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::TransformFactory;
    use crate::pipeline::renderer::TargetKind;
    use crate::scene::mesh::Mesh;
    use nalgebra::{Point3, Vector3};

    fn transforms() -> Transforms {
        Transforms {
            model: nalgebra::Matrix4::identity(),
            view: TransformFactory::view(&Point3::new(0.0, 0.0, 3.0), &Point3::origin(), &Vector3::y()),
            projection: TransformFactory::perspective(1.0, 45f32.to_radians(), 0.1, 100.0),
        }
    }

    fn sphere() -> Model {
        Model::new("sphere", vec![Mesh::create_uv_sphere(1.0, 8, 12)])
    }

    #[test]
    fn one_surface_submits_a_single_draw() {
        let mut renderer = Renderer::new(32, 32, 1);
        let mut pipeline = RefractionPipeline::new(32, 32);
        let selection = Selection {
            refraction: RefractionMethod::OneSurface,
            ..Selection::default()
        };
        pipeline.render(&mut renderer, &sphere(), &selection, &transforms());

        let draws = &renderer.stats().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, "refraction");
        assert_eq!(draws[0].cull_mode, CullMode::Back);
        assert_eq!(pipeline.state(), PassState::Idle);
    }

    #[test]
    fn two_surfaces_submit_backface_then_frontface() {
        let mut renderer = Renderer::new(32, 32, 1);
        let mut pipeline = RefractionPipeline::new(32, 32);
        let selection = Selection {
            refraction: RefractionMethod::TwoSurfaces,
            ..Selection::default()
        };
        pipeline.render(&mut renderer, &sphere(), &selection, &transforms());

        let draws = &renderer.stats().draws;
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program, "backface");
        assert_eq!(draws[0].target, TargetKind::Offscreen);
        assert_eq!(draws[0].cull_mode, CullMode::Front);
        assert_eq!(draws[1].program, "frontface");
        assert_eq!(draws[1].target, TargetKind::Default);
        assert_eq!(draws[1].cull_mode, CullMode::Back);

        assert_eq!(renderer.rasterizer.cull_mode, CullMode::Back);
        assert_eq!(renderer.bound_target(), TargetKind::Default);
        assert_eq!(renderer.units.active_unit(), 0);
        assert!(renderer.units.depth(BACKFACE_DEPTH_UNIT).is_some());
        assert_eq!(pipeline.state(), PassState::Idle);
    }

    #[test]
    fn backface_pass_captures_the_rear_surface() {
        let mut renderer = Renderer::new(32, 32, 1);
        let mut pipeline = RefractionPipeline::new(32, 32);
        let selection = Selection {
            refraction: RefractionMethod::TwoSurfaces,
            ..Selection::default()
        };
        pipeline.render(&mut renderer, &sphere(), &selection, &transforms());

        let depth = renderer.units.depth(BACKFACE_DEPTH_UNIT).unwrap();
        let center = depth.sample_nearest(nalgebra::Point2::new(0.5, 0.5)).unwrap();
        assert!(center < 1.0);
        let normal = renderer.units.color(BACKFACE_NORMAL_UNIT).unwrap();
        let n = normal.sample_nearest(nalgebra::Point2::new(0.5, 0.5)).unwrap();
        // The rear of the sphere faces away from the eye.
        assert!(n.z < -0.5);
    }

    #[test]
    fn empty_model_draws_nothing() {
        let mut renderer = Renderer::new(8, 8, 1);
        let mut pipeline = RefractionPipeline::new(8, 8);
        for refraction in RefractionMethod::ALL {
            let selection = Selection {
                refraction,
                ..Selection::default()
            };
            pipeline.render(&mut renderer, &Model::empty("none"), &selection, &transforms());
        }
        assert_eq!(renderer.stats().draw_calls(), 0);
    }

    #[test]
    fn transitions_follow_the_pass_order() {
        use PassState::*;
        assert!(Idle.can_transition_to(OneSurfacePass));
        assert!(TwoSurfaceBackfacePass.can_transition_to(TwoSurfaceFrontfacePass));
        assert!(!Idle.can_transition_to(TwoSurfaceFrontfacePass));
        assert!(!TwoSurfaceBackfacePass.can_transition_to(Idle));
        assert!(!OneSurfacePass.can_transition_to(TwoSurfaceBackfacePass));
    }

    #[test]
    fn target_follows_the_viewport() {
        let mut pipeline = RefractionPipeline::new(16, 16);
        pipeline.ensure_target_size(40, 20);
        assert_eq!(pipeline.backface_target().width(), 40);
        assert_eq!(pipeline.backface_target().height(), 20);
    }
}
