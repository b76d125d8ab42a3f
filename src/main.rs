use clap::Parser;
use log::{error, info};
use refractor::app::{run_gui, run_headless};
use refractor::io::config::Config;
use refractor::scene::selection::{ModelKind, RefractionMethod, SkyboxKind};
use std::path::PathBuf;

/// One- and two-surface refraction through glass models.
#[derive(Parser, Debug)]
#[command(name = "refractor", version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Render a single frame to the screenshot directory without a window
    #[arg(long)]
    pub headless: bool,

    #[arg(long, value_enum)]
    pub model: Option<ModelKind>,

    #[arg(long, value_enum)]
    pub refraction: Option<RefractionMethod>,

    #[arg(long, value_enum)]
    pub skybox: Option<SkyboxKind>,

    /// Index of refraction, clamped to [1.0, 2.5]
    #[arg(long)]
    pub ior: Option<f32>,

    /// Use the screen-space thickness alone (two surfaces)
    #[arg(long)]
    pub dv_only: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                Config::load(path).map_err(|e| e.to_string())?
            }
            None => {
                info!("Using default settings");
                Config::default()
            }
        };

        let selection = &mut config.selection;
        if let Some(model) = self.model {
            selection.model = model;
        }
        if let Some(refraction) = self.refraction {
            selection.refraction = refraction;
        }
        if let Some(skybox) = self.skybox {
            selection.skybox = skybox;
        }
        if let Some(ior) = self.ior {
            selection.ior = ior;
        }
        selection.dv_only |= self.dv_only;
        Ok(config)
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("egui_winit", log::LevelFilter::Warn)
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("glutin", log::LevelFilter::Warn)
        .filter_module("sctk", log::LevelFilter::Warn)
        .format_timestamp(None)
        .format_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config().inspect_err(|e| error!("{e}"))?;

    if cli.headless {
        let path = run_headless(&config).map_err(|e| {
            error!("Headless render failed: {e}");
            "Headless render failed".to_string()
        })?;
        info!("Wrote {}", path.display());
        return Ok(());
    }

    run_gui(config).map_err(|e| {
        error!("Failed to start GUI: {e}");
        "Failed to start GUI".to_string()
    })
}
