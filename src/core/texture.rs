use crate::scene::texture::Cubemap;
use log::warn;
use nalgebra::{Point2, Vector3};
use std::sync::Arc;

/// Number of texture units a draw call can sample from.
pub const MAX_TEXTURE_UNITS: usize = 4;

/// A 2D texture read back from a render target attachment.
/// Sampled with nearest filtering and clamp-to-edge addressing.
#[derive(Debug, Clone)]
pub struct AttachmentTexture<T> {
    pub width: usize,
    pub height: usize,
    texels: Vec<T>,
}

impl<T: Copy> AttachmentTexture<T> {
    /// `texels` is row-major, top row first.
    pub fn new(width: usize, height: usize, texels: Vec<T>) -> Self {
        debug_assert_eq!(texels.len(), width * height);
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn texel(&self, x: usize, y: usize) -> Option<T> {
        (x < self.width && y < self.height).then(|| self.texels[y * self.width + x])
    }

    /// Nearest-texel lookup. `uv` uses the window convention of
    /// [`FragmentInput::screen_uv`](crate::core::pipeline::FragmentInput).
    /// Returns `None` for an empty texture.
    pub fn sample_nearest(&self, uv: Point2<f32>) -> Option<T> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x = (uv.x.clamp(0.0, 1.0) * self.width as f32) as usize;
        let y = (uv.y.clamp(0.0, 1.0) * self.height as f32) as usize;
        self.texel(x.min(self.width - 1), y.min(self.height - 1))
    }
}

/// A texture object bound to a unit.
#[derive(Debug, Clone)]
pub enum TextureBinding {
    Cubemap(Arc<Cubemap>),
    Color(Arc<AttachmentTexture<Vector3<f32>>>),
    Depth(Arc<AttachmentTexture<f32>>),
}

/// The texture unit table of the renderer.
///
/// Binding goes through the active unit, like `glActiveTexture` followed by
/// `glBindTexture`.
#[derive(Debug, Clone, Default)]
pub struct TextureUnits {
    active: usize,
    slots: [Option<TextureBinding>; MAX_TEXTURE_UNITS],
}

impl TextureUnits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_unit(&self) -> usize {
        self.active
    }

    /// Selects the unit that subsequent `bind` calls affect.
    /// Out-of-range units are rejected and leave the active unit unchanged.
    pub fn active_texture(&mut self, unit: usize) {
        if unit < MAX_TEXTURE_UNITS {
            self.active = unit;
        } else {
            warn!(
                "Texture unit {} out of range (max {}). Ignored.",
                unit,
                MAX_TEXTURE_UNITS - 1
            );
        }
    }

    pub fn bind(&mut self, binding: TextureBinding) {
        self.slots[self.active] = Some(binding);
    }

    /// Shorthand for `active_texture(unit)` + `bind(binding)`.
    pub fn bind_unit(&mut self, unit: usize, binding: TextureBinding) {
        self.active_texture(unit);
        if self.active == unit {
            self.bind(binding);
        }
    }

    pub fn unbind_all(&mut self) {
        self.slots = Default::default();
        self.active = 0;
    }

    pub fn get(&self, unit: usize) -> Option<&TextureBinding> {
        self.slots.get(unit).and_then(|s| s.as_ref())
    }

    pub fn cubemap(&self, unit: usize) -> Option<&Cubemap> {
        match self.get(unit) {
            Some(TextureBinding::Cubemap(c)) => Some(c),
            _ => None,
        }
    }

    pub fn color(&self, unit: usize) -> Option<&AttachmentTexture<Vector3<f32>>> {
        match self.get(unit) {
            Some(TextureBinding::Color(t)) => Some(t),
            _ => None,
        }
    }

    pub fn depth(&self, unit: usize) -> Option<&AttachmentTexture<f32>> {
        match self.get(unit) {
            Some(TextureBinding::Depth(t)) => Some(t),
            _ => None,
        }
    }
}
