use crate::core::framebuffer::FrameBuffer;
use crate::core::pipeline::{Program, Shader};
use crate::core::texture::AttachmentTexture;
use crate::pipeline::renderer::{CLEAR_DEPTH, Renderer, TargetKind};
use crate::scene::model::Model;
use log::{error, info, trace};
use nalgebra::Vector3;
use std::sync::Arc;

/// Largest width or height an off-screen target accepts.
pub const MAX_TARGET_DIMENSION: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Complete,
    Incomplete(String),
}

/// An off-screen framebuffer with a float normal attachment and a depth
/// attachment, read back as nearest-filtered, edge-clamped textures.
pub struct RenderTarget {
    framebuffer: FrameBuffer,
    status: TargetStatus,
}

impl RenderTarget {
    /// Allocates the attachments. An incomplete target is reported once here;
    /// it can still be bound and drawn to, producing nothing.
    pub fn new(width: usize, height: usize) -> Self {
        let status = Self::check(width, height);
        let framebuffer = match status {
            TargetStatus::Complete => FrameBuffer::new(width, height, 1),
            TargetStatus::Incomplete(_) => FrameBuffer::new(0, 0, 1),
        };

        match &status {
            TargetStatus::Complete => info!("Render target created ({}x{})", width, height),
            TargetStatus::Incomplete(reason) => {
                error!("Render target is not complete: {}", reason)
            }
        }

        Self {
            framebuffer,
            status,
        }
    }

    fn check(width: usize, height: usize) -> TargetStatus {
        if width == 0 || height == 0 {
            TargetStatus::Incomplete(format!("zero-sized attachment ({}x{})", width, height))
        } else if width > MAX_TARGET_DIMENSION || height > MAX_TARGET_DIMENSION {
            TargetStatus::Incomplete(format!(
                "attachment {}x{} exceeds the maximum of {}",
                width, height, MAX_TARGET_DIMENSION
            ))
        } else {
            TargetStatus::Complete
        }
    }

    pub fn status(&self) -> &TargetStatus {
        &self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == TargetStatus::Complete
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height
    }

    /// Recreates the attachments if the requested size differs from the
    /// current one. Returns true if it did.
    pub fn ensure_size(&mut self, width: usize, height: usize) -> bool {
        let requested = Self::check(width, height);
        let unchanged = match (&self.status, &requested) {
            (TargetStatus::Complete, TargetStatus::Complete) => {
                self.framebuffer.width == width && self.framebuffer.height == height
            }
            (current, requested) => current == requested,
        };
        if unchanged {
            return false;
        }
        *self = Self::new(width, height);
        true
    }

    /// Makes this target the destination of draws until the guard drops.
    pub fn bind<'a>(&'a mut self, renderer: &'a mut Renderer) -> BoundTarget<'a> {
        trace!("Render target bound");
        renderer.bound_target = TargetKind::Offscreen;
        BoundTarget {
            renderer,
            target: self,
        }
    }

    /// Snapshot of the normal attachment.
    pub fn normal_texture(&mut self) -> Arc<AttachmentTexture<Vector3<f32>>> {
        let (w, h) = (self.framebuffer.width, self.framebuffer.height);
        Arc::new(AttachmentTexture::new(w, h, self.framebuffer.color_samples()))
    }

    /// Snapshot of the depth attachment (window depth in [0, 1]).
    pub fn depth_texture(&self) -> Arc<AttachmentTexture<f32>> {
        let (w, h) = (self.framebuffer.width, self.framebuffer.height);
        Arc::new(AttachmentTexture::new(w, h, self.framebuffer.depth_samples()))
    }
}

/// A render target bound for drawing. Dropping it restores the default
/// framebuffer.
pub struct BoundTarget<'a> {
    renderer: &'a mut Renderer,
    target: &'a mut RenderTarget,
}

impl BoundTarget<'_> {
    /// Clears normals to zero and depth to the far plane.
    pub fn clear(&mut self) {
        self.target.framebuffer.clear(Vector3::zeros(), CLEAR_DEPTH);
    }

    /// Fixed-function state and texture units stay reachable while bound.
    pub fn renderer(&mut self) -> &mut Renderer {
        self.renderer
    }

    pub fn draw_model<S: Shader + Program>(&mut self, model: &Model, shader: &S) {
        self.renderer
            .draw_model_into(Some(&self.target.framebuffer), model, shader);
    }
}

impl Drop for BoundTarget<'_> {
    fn drop(&mut self) {
        self.renderer.bound_target = TargetKind::Default;
        trace!("Render target unbound");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resizes_only_when_the_viewport_changes() {
        let mut target = RenderTarget::new(64, 32);
        assert!(target.is_complete());
        assert!(!target.ensure_size(64, 32));
        assert!(target.ensure_size(100, 50));
        assert_eq!((target.width(), target.height()), (100, 50));

        let depth = target.depth_texture();
        assert_eq!((depth.width, depth.height), (100, 50));
        assert_eq!(target.normal_texture().width, 100);
    }

    #[test]
    fn zero_sized_targets_are_incomplete_but_usable() {
        let mut target = RenderTarget::new(0, 10);
        assert!(matches!(target.status(), TargetStatus::Incomplete(_)));
        assert!(!target.ensure_size(0, 10));

        let mut renderer = Renderer::new(4, 4, 1);
        {
            let mut bound = target.bind(&mut renderer);
            bound.clear();
            bound.draw_model(&Model::empty("none"), &crate::pipeline::shaders::backface::BackfaceShader::new());
        }
        assert_eq!(target.depth_texture().sample_nearest(nalgebra::Point2::new(0.5, 0.5)), None);

        assert!(target.ensure_size(8, 8));
        assert!(target.is_complete());
    }

    #[test]
    fn binding_is_scoped_to_the_guard() {
        let mut target = RenderTarget::new(4, 4);
        let mut renderer = Renderer::new(4, 4, 1);
        {
            let mut bound = target.bind(&mut renderer);
            assert_eq!(bound.renderer().bound_target(), TargetKind::Offscreen);
        }
        assert_eq!(renderer.bound_target(), TargetKind::Default);
    }

    #[test]
    fn clear_resets_depth_to_the_far_plane() {
        let mut target = RenderTarget::new(2, 2);
        let mut renderer = Renderer::new(2, 2, 1);
        target.bind(&mut renderer).clear();
        let depth = target.depth_texture();
        assert_eq!(depth.texel(1, 1), Some(CLEAR_DEPTH));
    }
}
