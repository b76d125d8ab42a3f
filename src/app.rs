use crate::io::config::Config;
use crate::io::screenshot::ScreenshotError;
use crate::pipeline::frame::{FrameDriver, load_models};
use crate::pipeline::skybox::SkyboxRenderer;
use crate::scene::selection::Selection;
use crate::ui::input::{CameraController, FrameInput};
use crate::ui::panel::draw_panel;
use egui::{ColorImage, TextureHandle, TextureOptions, ViewportCommand};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

const PANEL_WIDTH: f32 = 240.0;

/// Interactive window: settings panel on the left, rendered frame filling
/// the rest.
pub struct RefractionApp {
    driver: FrameDriver,
    controller: CameraController,
    selection: Selection,
    benchmark_frames: u32,
    frame_texture: Option<TextureHandle>,
    last_frame: Instant,
}

impl RefractionApp {
    pub fn new(config: &Config) -> Self {
        Self {
            driver: FrameDriver::load(config),
            controller: CameraController::new(config.camera.zoom_speed),
            selection: config.selection.to_selection(),
            benchmark_frames: config.output.benchmark_frames,
            frame_texture: None,
            last_frame: Instant::now(),
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, dt: f32) {
        let input = FrameInput::gather(ctx);
        let response = self.controller.apply(&input, &mut self.driver.camera, dt);

        if let Some(captured) = response.capture_changed {
            let grab = if captured {
                egui::CursorGrab::Confined
            } else {
                egui::CursorGrab::None
            };
            ctx.send_viewport_cmd(ViewportCommand::CursorGrab(grab));
            ctx.send_viewport_cmd(ViewportCommand::CursorVisible(!captured));
            debug!("Mouse capture: {}", captured);
        }
        if response.reset {
            self.driver.reset_view();
        }
        if response.exit {
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }
    }

    fn show_frame(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let [width, height] = [self.driver.renderer.width(), self.driver.renderer.height()];
        let image = ColorImage::from_rgba_unmultiplied([width, height], &self.driver.frame_rgba());

        if let Some(texture) = &mut self.frame_texture {
            texture.set(image, TextureOptions::NEAREST);
        } else {
            self.frame_texture = Some(ctx.load_texture("frame", image, TextureOptions::NEAREST));
        }
        if let Some(texture) = &self.frame_texture {
            ui.add(egui::Image::new(texture).fit_to_exact_size(ui.available_size()));
        }
    }
}

impl eframe::App for RefractionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.handle_input(ctx, dt);

        // The panel stays hidden while a benchmark runs.
        if !self.driver.benchmark().is_active() {
            egui::SidePanel::left("settings")
                .exact_width(PANEL_WIDTH)
                .resizable(false)
                .show(ctx, |ui| {
                    let actions = draw_panel(ui, &mut self.selection, self.benchmark_frames);
                    if actions.screenshot {
                        self.driver.request_screenshot();
                    }
                    if actions.start_fps_test {
                        self.driver
                            .start_benchmark(self.benchmark_frames, &self.selection);
                    }
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let size = ui.available_size();
                let viewport = (size.x.max(1.0) as usize, size.y.max(1.0) as usize);
                self.driver.render_frame(&self.selection, viewport, dt);
                self.show_frame(ctx, ui);
            });

        ctx.request_repaint();
    }
}

/// Opens the window and runs until it is closed.
pub fn run_gui(config: Config) -> Result<(), eframe::Error> {
    info!(
        "Starting GUI mode ({}x{})...",
        config.render.width, config.render.height
    );
    info!("Controls: WASD=Move, Q/E=Up/Down, I=Mouse look, Scroll=Zoom, R=Reset, Esc=Quit");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Refraction")
            .with_inner_size([
                config.render.width as f32 + PANEL_WIDTH,
                config.render.height as f32,
            ]),
        ..Default::default()
    };

    eframe::run_native(
        "Refraction",
        options,
        Box::new(move |_cc| Ok(Box::new(RefractionApp::new(&config)))),
    )
}

/// Renders one frame of the configured selection and writes it as a
/// screenshot. Only the selected model is loaded.
pub fn run_headless(config: &Config) -> Result<PathBuf, ScreenshotError> {
    info!("Starting headless mode...");
    let start_time = Instant::now();
    let selection = config.selection.to_selection();

    let models = load_models(&config.assets, Some(selection.model));
    let skybox = SkyboxRenderer::load(&config.assets.skybox_dir);
    let mut driver = FrameDriver::new(config, models, skybox);

    let viewport = (config.render.width, config.render.height);
    driver.render_frame(&selection, viewport, 0.0);
    info!("Render completed in {:.2?}", start_time.elapsed());

    driver.save_screenshot(&selection)
}
