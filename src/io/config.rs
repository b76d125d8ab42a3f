use crate::scene::selection::{ModelKind, RefractionMethod, Selection, SkyboxKind};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    // --- Output & Quality ---
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_exposure")]
    pub exposure: f32,
    #[serde(default)]
    pub use_aces: bool,

    // --- Frame ---
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
    /// Degrees per second while spin is on.
    #[serde(default = "default_spin_speed")]
    pub spin_speed: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            exposure: default_exposure(),
            use_aces: false,
            clear_color: default_clear_color(),
            spin_speed: default_spin_speed(),
        }
    }
}

fn default_width() -> usize {
    800
}
fn default_height() -> usize {
    600
}
fn default_samples() -> usize {
    1
}
fn default_exposure() -> f32 {
    1.0
}
fn default_clear_color() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}
fn default_spin_speed() -> f32 {
    20.0
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    /// Where the "Zoom In" toggle moves the camera.
    #[serde(default = "default_zoom_in_position")]
    pub zoom_in_position: [f32; 3],
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default)]
    pub zoom_enabled: bool,
    /// Pins the camera height while moving.
    #[serde(default)]
    pub fixed_height: Option<f32>,
    /// Zoom degrees per scrolled point (a wheel notch is about 50 points).
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            zoom_in_position: default_zoom_in_position(),
            speed: default_speed(),
            sensitivity: default_sensitivity(),
            zoom: default_zoom(),
            zoom_enabled: false,
            fixed_height: None,
            zoom_speed: default_zoom_speed(),
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 5.0]
}
fn default_zoom_in_position() -> [f32; 3] {
    [0.0, 0.0, 4.0]
}
fn default_speed() -> f32 {
    3.0
}
fn default_sensitivity() -> f32 {
    0.1
}
fn default_zoom() -> f32 {
    50.0
}
fn default_zoom_speed() -> f32 {
    0.02
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default = "default_skybox_dir")]
    pub skybox_dir: PathBuf,
    /// Center and scale every model into the unit cube.
    #[serde(default = "default_true")]
    pub normalize_models: bool,
    /// Ray-cast d_N for models whose file carries no vertex colors.
    #[serde(default)]
    pub compute_missing_d_n: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            skybox_dir: default_skybox_dir(),
            normalize_models: true,
            compute_missing_d_n: false,
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}
fn default_skybox_dir() -> PathBuf {
    PathBuf::from("skybox")
}

impl AssetsConfig {
    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        self.models_dir.join(format!("{}.obj", kind.file_stem()))
    }
}

/// Initial panel state.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default)]
    pub refraction: RefractionMethod,
    #[serde(default)]
    pub skybox: SkyboxKind,
    #[serde(default = "default_ior")]
    pub ior: f32,
    #[serde(default)]
    pub spin: bool,
    #[serde(default = "default_true")]
    pub reflect: bool,
    #[serde(default)]
    pub dv_only: bool,
    #[serde(default)]
    pub zoom_in: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            refraction: RefractionMethod::default(),
            skybox: SkyboxKind::default(),
            ior: default_ior(),
            spin: false,
            reflect: true,
            dv_only: false,
            zoom_in: false,
        }
    }
}

fn default_ior() -> f32 {
    1.5
}

impl SelectionConfig {
    pub fn to_selection(&self) -> Selection {
        let mut selection = Selection {
            model: self.model,
            refraction: self.refraction,
            skybox: self.skybox,
            spin: self.spin,
            reflect: self.reflect,
            dv_only: self.dv_only,
            zoom_in: self.zoom_in,
            ..Selection::default()
        };
        selection.set_ior(self.ior);
        selection
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
    #[serde(default = "default_benchmark_frames")]
    pub benchmark_frames: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
            benchmark_frames: default_benchmark_frames(),
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}
fn default_benchmark_frames() -> u32 {
    crate::pipeline::benchmark::DEFAULT_BENCHMARK_FRAMES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.render.clear_color, [0.1, 0.1, 0.1]);
        assert_eq!(config.camera.position, [0.0, 0.0, 5.0]);
        assert_eq!(config.output.screenshot_dir, PathBuf::from("screenshots"));
        assert_eq!(config.output.benchmark_frames, 1000);
        assert_eq!(config.selection.to_selection(), Selection::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [render]
            width = 320

            [selection]
            model = "sphere"
            refraction = "two_surfaces"
            skybox = "night_sky"
            ior = 9.0
            "#,
        )
        .unwrap();
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.height, 600);

        let selection = config.selection.to_selection();
        assert_eq!(selection.model, ModelKind::Sphere);
        assert_eq!(selection.refraction, RefractionMethod::TwoSurfaces);
        assert_eq!(selection.skybox, SkyboxKind::NightSky);
        assert_eq!(selection.ior, 2.5);
    }

    #[test]
    fn unknown_option_names_are_rejected() {
        assert!(Config::parse("[selection]\nmodel = \"cube\"").is_err());
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("here.toml"));
    }

    #[test]
    fn model_paths_use_the_file_stem() {
        let assets = AssetsConfig::default();
        assert_eq!(
            assets.model_path(ModelKind::Monkey),
            PathBuf::from("models/suzanne_monkey.obj")
        );
    }
}
