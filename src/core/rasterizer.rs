use crate::core::framebuffer::FrameBuffer;
use crate::core::math::interpolation::Barycentric;
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen, ndc_to_window_depth};
use crate::core::pipeline::{FragmentInput, Interpolatable, Shader};
use crate::core::texture::TextureUnits;
use nalgebra::{Point2, Vector3, Vector4};
use rayon::prelude::*;

/// Which triangle faces are discarded before rasterization.
/// Counter-clockwise triangles (as seen on screen) are front faces.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CullMode {
    Back,
    Front,
    None,
}

/// The Rasterizer is responsible for drawing geometric primitives onto the FrameBuffer.
/// It carries the fixed-function state that draw calls toggle.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    pub cull_mode: CullMode,
    pub depth_test: bool,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

type ClipVertex<V> = (Vector4<f32>, V);

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::Back,
            depth_test: true,
        }
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    /// Rasterize a single triangle given clip-space coordinates and corresponding varyings.
    ///
    /// This function performs **Sutherland–Hodgman clipping** against the canonical
    /// view frustum (W-normalization planes) in Homogeneous Clip Space.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        units: &TextureUnits,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        // A triangle clipped by the six planes has at most 9 vertices.
        let mut current_poly: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        let mut clip_buffer: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);

        for i in 0..3 {
            current_poly.push((clip_coords[i], varyings[i]));
        }

        // (Axis Index, Sign). Plane Eq: Sign * P[Axis] <= P.w
        let planes = [
            (0, 1.0),  // Right:  +X <= W
            (0, -1.0), // Left:   -X <= W
            (1, 1.0),  // Top:    +Y <= W
            (1, -1.0), // Bottom: -Y <= W
            (2, 1.0),  // Far:    +Z <= W
            (2, -1.0), // Near:   -Z <= W
        ];

        for &(axis, sign) in &planes {
            if current_poly.is_empty() {
                return;
            }
            Self::clip_polygon_against_plane(&current_poly, &mut clip_buffer, axis, sign);
            std::mem::swap(&mut current_poly, &mut clip_buffer);
        }

        if current_poly.len() < 3 {
            return;
        }

        // Convex result: triangulate as a fan around v0.
        let v0 = current_poly[0];
        for i in 1..(current_poly.len() - 1) {
            let v1 = current_poly[i];
            let v2 = current_poly[i + 1];

            self.rasterize_triangle_clipped(
                framebuffer,
                shader,
                units,
                &[v0.0, v1.0, v2.0],
                &[v0.1, v1.1, v2.1],
            );
        }
    }

    /// Clips a polygon against one plane, writing into `output` (cleared first).
    fn clip_polygon_against_plane<V: Interpolatable>(
        input: &[ClipVertex<V>],
        output: &mut Vec<ClipVertex<V>>,
        axis: usize,
        sign: f32,
    ) {
        output.clear();

        let Some(&last) = input.last() else {
            return;
        };

        let is_inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;

        let mut prev = last;
        let mut prev_inside = is_inside(&prev.0);

        for curr in input {
            let curr_inside = is_inside(&curr.0);

            if curr_inside {
                if !prev_inside
                    && let Some(inter) = Self::intersect_edge_plane(prev, *curr, axis, sign)
                {
                    output.push(inter);
                }
                output.push(*curr);
            } else if prev_inside
                && let Some(inter) = Self::intersect_edge_plane(prev, *curr, axis, sign)
            {
                output.push(inter);
            }

            prev = *curr;
            prev_inside = curr_inside;
        }
    }

    /// Intersection of a clip-space edge with a clip plane; interpolates the
    /// position and the varying.
    #[inline(always)]
    fn intersect_edge_plane<V: Interpolatable>(
        a: ClipVertex<V>,
        b: ClipVertex<V>,
        axis: usize,
        sign: f32,
    ) -> Option<ClipVertex<V>> {
        let ac = a.0[axis];
        let bc = b.0[axis];
        let aw = a.0.w;
        let bw = b.0.w;

        let denom = sign * (bc - ac) - (bw - aw);
        if denom.abs() < 1e-9 {
            return None;
        }

        let t = (aw - sign * ac) / denom;
        if !t.is_finite() {
            return None;
        }

        let pos = a.0 + (b.0 - a.0) * t;
        let vary = a.1 * (1.0 - t) + b.1 * t;
        Some((pos, vary))
    }

    /// Rasterizes a triangle known to lie inside the frustum: perspective
    /// division, viewport transform, culling, then per-pixel shading.
    fn rasterize_triangle_clipped<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        units: &TextureUnits,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        if framebuffer.buffer_width == 0 || framebuffer.buffer_height == 0 {
            return;
        }
        let width = framebuffer.buffer_width as f32;
        let height = framebuffer.buffer_height as f32;

        let mut screen_coords = [Point2::origin(); 3];
        let mut w_values = [0.0; 3];
        let mut ndc_z = Vector3::zeros();

        for i in 0..3 {
            if clip_coords[i].w.abs() < 1e-6 {
                return;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            w_values[i] = clip_coords[i].w;
            ndc_z[i] = ndc.z;
            screen_coords[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
        }

        // Screen Y points down, so counter-clockwise (front) triangles have a
        // negative signed area here.
        let [v0, v1, v2] = screen_coords;
        let edge1 = v1 - v0;
        let edge2 = v2 - v1;
        let signed_area = edge1.x * edge2.y - edge1.y * edge2.x;

        match self.cull_mode {
            CullMode::Back if signed_area >= 0.0 => return,
            CullMode::Front if signed_area <= 0.0 => return,
            _ => {}
        }

        let (min_x, min_y, max_x, max_y) = Self::compute_bounding_box(&screen_coords);

        // Scissor Test
        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.buffer_width as i32
            || min_y >= framebuffer.buffer_height as i32
        {
            return;
        }

        let start_x = min_x.max(0) as usize;
        let end_x = (max_x.min(framebuffer.buffer_width as i32 - 1)) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = (max_y.min(framebuffer.buffer_height as i32 - 1)) as usize;

        // Rows vary in cost, work-stealing balances them.
        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

                let Some(bary) = Barycentric::of(pixel_center, v0, v1, v2) else {
                    continue;
                };
                if !bary.is_inside() {
                    continue;
                }

                // Perspective-correct weights drive both depth and varyings.
                let Some(weights) = bary.perspective_corrected(w_values) else {
                    continue;
                };

                // NDC depth is affine in screen space: linear weights.
                let z_ndc = bary.0.dot(&ndc_z);
                let depth = ndc_to_window_depth(z_ndc);

                if self.depth_test && !framebuffer.depth_test_and_update(x, y, depth) {
                    continue;
                }

                let interpolated = varyings[0] * weights.x
                    + varyings[1] * weights.y
                    + varyings[2] * weights.z;

                let input = FragmentInput {
                    screen_uv: Point2::new(pixel_center.x / width, pixel_center.y / height),
                    depth,
                };
                let color = shader.fragment(interpolated, &input, units);

                framebuffer.set_pixel_safe(x, y, color);
            }
        });
    }

    fn compute_bounding_box(points: &[Point2<f32>; 3]) -> (i32, i32, i32, i32) {
        let min_x = points[0].x.min(points[1].x).min(points[2].x).floor() as i32;
        let min_y = points[0].y.min(points[1].y).min(points[2].y).floor() as i32;
        let max_x = points[0].x.max(points[1].x).max(points[2].x).ceil() as i32;
        let max_y = points[0].y.max(points[1].y).max(points[2].y).ceil() as i32;
        (min_x, min_y, max_x, max_y)
    }
}
