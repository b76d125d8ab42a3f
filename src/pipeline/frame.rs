use crate::core::math::transform::TransformFactory;
use crate::core::pipeline::Transforms;
use crate::io::config::{AssetsConfig, CameraConfig, Config};
use crate::io::obj_loader::{ModelLoadOptions, load_model};
use crate::io::screenshot::{ScreenshotError, save_screenshot};
use crate::pipeline::benchmark::FpsBenchmark;
use crate::pipeline::passes::RefractionPipeline;
use crate::pipeline::renderer::{PostProcess, Renderer};
use crate::pipeline::skybox::SkyboxRenderer;
use crate::scene::camera::{Camera, CameraDefaults};
use crate::scene::model::Model;
use crate::scene::selection::{ModelKind, Selection};
use log::{debug, error, info};
use nalgebra::{Point3, Vector3};
use std::path::PathBuf;

/// Loads the bundled models, indexed by [`ModelKind::index`]. With `only`
/// set, the other slots hold empty models.
pub fn load_models(assets: &AssetsConfig, only: Option<ModelKind>) -> Vec<Model> {
    let options = ModelLoadOptions {
        normalize: assets.normalize_models,
        compute_missing_d_n: assets.compute_missing_d_n,
    };
    ModelKind::ALL
        .iter()
        .map(|&kind| match only {
            Some(wanted) if wanted != kind => Model::empty(kind.label()),
            _ => load_model(assets.model_path(kind), kind.label(), options),
        })
        .collect()
}

pub fn camera_from_config(config: &CameraConfig) -> Camera {
    let mut camera = Camera::new(CameraDefaults {
        position: Point3::from(config.position),
        speed: config.speed,
        sensitivity: config.sensitivity,
        zoom: config.zoom,
    });
    camera.zoom_enabled = config.zoom_enabled;
    camera.fixed_height = config.fixed_height;
    camera
}

/// What a frame produced besides the image.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub screenshot: Option<PathBuf>,
}

/// Runs one frame: clear, spin, zoom toggle, matrices, skybox, refraction
/// passes, then the requested screenshot.
pub struct FrameDriver {
    pub renderer: Renderer,
    pub camera: Camera,
    pipeline: RefractionPipeline,
    skybox: SkyboxRenderer,
    models: Vec<Model>,
    benchmark: FpsBenchmark,

    /// Model rotation about Y in degrees.
    rotation_y: f32,
    spin_speed: f32,
    clear_color: Vector3<f32>,
    post: PostProcess,

    home_position: Point3<f32>,
    zoom_in_position: Point3<f32>,
    last_zoom_in: bool,

    screenshot_requested: bool,
    screenshot_dir: PathBuf,
}

impl FrameDriver {
    pub fn new(config: &Config, models: Vec<Model>, skybox: SkyboxRenderer) -> Self {
        let (width, height) = (config.render.width, config.render.height);
        Self {
            renderer: Renderer::new(width, height, config.render.samples.max(1)),
            camera: camera_from_config(&config.camera),
            pipeline: RefractionPipeline::new(width, height),
            skybox,
            models,
            benchmark: FpsBenchmark::new(),
            rotation_y: 0.0,
            spin_speed: config.render.spin_speed,
            clear_color: Vector3::from(config.render.clear_color),
            post: PostProcess {
                exposure: config.render.exposure,
                use_aces: config.render.use_aces,
            },
            home_position: Point3::from(config.camera.position),
            zoom_in_position: Point3::from(config.camera.zoom_in_position),
            last_zoom_in: false,
            screenshot_requested: false,
            screenshot_dir: config.output.screenshot_dir.clone(),
        }
    }

    /// Loads every model and skybox named by the config.
    pub fn load(config: &Config) -> Self {
        let models = load_models(&config.assets, None);
        let skybox = SkyboxRenderer::load(&config.assets.skybox_dir);
        Self::new(config, models, skybox)
    }

    pub fn model(&self, kind: ModelKind) -> Option<&Model> {
        self.models.get(kind.index())
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn benchmark(&self) -> &FpsBenchmark {
        &self.benchmark
    }

    pub fn start_benchmark(&mut self, frames: u32, selection: &Selection) {
        self.benchmark.start(frames, selection);
    }

    /// Takes a screenshot at the end of the next frame.
    pub fn request_screenshot(&mut self) {
        self.screenshot_requested = true;
    }

    /// Camera back to its start and the model back to unrotated.
    pub fn reset_view(&mut self) {
        self.camera.reset();
        self.rotation_y = 0.0;
        info!("Camera and spin reset");
    }

    pub fn render_frame(
        &mut self,
        selection: &Selection,
        viewport: (usize, usize),
        dt: f32,
    ) -> FrameReport {
        let (width, height) = (viewport.0.max(1), viewport.1.max(1));
        self.benchmark.update(dt);

        if self.renderer.resize(width, height) {
            debug!("Viewport resized to {}x{}", width, height);
        }
        self.renderer.begin_frame();
        self.renderer.clear(self.clear_color);

        if selection.spin {
            self.rotation_y = (self.rotation_y + self.spin_speed * dt) % 360.0;
        }
        self.apply_zoom_in(selection.zoom_in);

        let aspect = width as f32 / height as f32;
        let transforms = Transforms {
            model: TransformFactory::rotation_y(self.rotation_y.to_radians()),
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(aspect),
        };

        self.pipeline.ensure_target_size(width, height);
        self.skybox.draw(
            &mut self.renderer,
            selection.skybox,
            &transforms.view,
            &transforms.projection,
        );
        match self.models.get(selection.model.index()) {
            Some(model) => self
                .pipeline
                .render(&mut self.renderer, model, selection, &transforms),
            None => error!("No model loaded for {}", selection.model.label()),
        }

        let mut report = FrameReport::default();
        if std::mem::take(&mut self.screenshot_requested) {
            match self.save_screenshot(selection) {
                Ok(path) => report.screenshot = Some(path),
                Err(e) => error!("{}", e),
            }
        }
        report
    }

    /// Moves the camera only when the toggle changes, so free movement in
    /// between is kept.
    fn apply_zoom_in(&mut self, zoom_in: bool) {
        if self.last_zoom_in == zoom_in {
            return;
        }
        self.camera.position = if zoom_in {
            self.zoom_in_position
        } else {
            self.home_position
        };
        self.last_zoom_in = zoom_in;
    }

    /// The current frame as top-row-first RGBA8.
    pub fn frame_rgba(&self) -> Vec<u8> {
        self.renderer.post_process_to_rgba(&self.post)
    }

    /// Writes the current frame under the screenshot directory, named after `selection`.
    pub fn save_screenshot(&self, selection: &Selection) -> Result<PathBuf, ScreenshotError> {
        save_screenshot(
            &self.screenshot_dir,
            &selection.screenshot_file_name(),
            self.renderer.width(),
            self.renderer.height(),
            self.frame_rgba(),
        )
    }
}
