use clap::ValueEnum;
use serde::Deserialize;

/// The five bundled models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Teapot,
    Donut,
    Sphere,
    Monkey,
    Buddha,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Teapot,
        ModelKind::Donut,
        ModelKind::Sphere,
        ModelKind::Monkey,
        ModelKind::Buddha,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Teapot => "Teapot",
            ModelKind::Donut => "Donut",
            ModelKind::Sphere => "Sphere",
            ModelKind::Monkey => "Monkey",
            ModelKind::Buddha => "Buddha",
        }
    }

    /// OBJ file stem under the models directory.
    pub fn file_stem(self) -> &'static str {
        match self {
            ModelKind::Teapot => "teapot",
            ModelKind::Donut => "donut",
            ModelKind::Sphere => "sphere",
            ModelKind::Monkey => "suzanne_monkey",
            ModelKind::Buddha => "buddha",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RefractionMethod {
    #[default]
    OneSurface,
    TwoSurfaces,
}

impl RefractionMethod {
    pub const ALL: [RefractionMethod; 2] =
        [RefractionMethod::OneSurface, RefractionMethod::TwoSurfaces];

    pub fn label(self) -> &'static str {
        match self {
            RefractionMethod::OneSurface => "One Surface",
            RefractionMethod::TwoSurfaces => "Two Surfaces",
        }
    }
}

/// The three bundled environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SkyboxKind {
    #[default]
    Graffiti,
    NightSky,
    Museum,
}

impl SkyboxKind {
    pub const ALL: [SkyboxKind; 3] = [SkyboxKind::Graffiti, SkyboxKind::NightSky, SkyboxKind::Museum];

    pub fn label(self) -> &'static str {
        match self {
            SkyboxKind::Graffiti => "Graffiti",
            SkyboxKind::NightSky => "Night Sky",
            SkyboxKind::Museum => "Museum",
        }
    }

    /// Directory holding the six face images.
    pub fn dir_name(self) -> &'static str {
        match self {
            SkyboxKind::Graffiti => "graffiti_cubemap",
            SkyboxKind::NightSky => "nightsky_cubemap",
            SkyboxKind::Museum => "museum_cubemap",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

pub const IOR_MIN: f32 = 1.0;
pub const IOR_MAX: f32 = 2.5;

/// Everything the user picks in the panel. Read by the renderer every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub model: ModelKind,
    pub refraction: RefractionMethod,
    pub skybox: SkyboxKind,
    pub ior: f32,
    pub spin: bool,
    pub reflect: bool,
    /// Two-surface mode only: use the screen-space distance d_V alone.
    pub dv_only: bool,
    pub zoom_in: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            refraction: RefractionMethod::default(),
            skybox: SkyboxKind::default(),
            ior: 1.5,
            spin: false,
            reflect: true,
            dv_only: false,
            zoom_in: false,
        }
    }
}

impl Selection {
    pub fn set_ior(&mut self, ior: f32) {
        self.ior = ior.clamp(IOR_MIN, IOR_MAX);
    }

    fn technique_suffix(&self) -> &'static str {
        match (self.refraction, self.dv_only) {
            (RefractionMethod::OneSurface, _) => "_1_surface",
            (RefractionMethod::TwoSurfaces, true) => "_2_surfaces_dv_only",
            (RefractionMethod::TwoSurfaces, false) => "_2_surfaces_dn_dv",
        }
    }

    /// `<Model>_<Skybox>_IOR_<ior, 3 decimals><technique>.png`
    pub fn screenshot_file_name(&self) -> String {
        format!(
            "{}_{}_IOR_{:.3}{}.png",
            self.model.label(),
            self.skybox.label(),
            self.ior,
            self.technique_suffix()
        )
    }
}
