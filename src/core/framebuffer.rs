use atomic_float::AtomicF32;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

/// A 2D buffer pair: one float RGB color attachment and one depth attachment.
/// Thread-safe for parallel rendering using atomic depth and striped locking for color.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Color buffer wrapped in UnsafeCell to allow interior mutability.
    /// Safety is guaranteed by `locks` and depth testing.
    color_buffer: UnsafeCell<Vec<Vector3<f32>>>,

    /// Depth buffer, one atomic per sample.
    depth_buffer: Vec<AtomicF32>,

    /// Striped locks to protect color writes.
    /// We map pixel coordinates to a lock index to reduce contention.
    locks: Vec<Mutex<()>>,
}

// Color writes go through `locks`, depth through atomics.
unsafe impl Sync for FrameBuffer {}

const LOCK_STRIPES: usize = 1024;

impl FrameBuffer {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;
        let size = buffer_width * buffer_height;

        let depth_buffer = (0..size).map(|_| AtomicF32::new(f32::INFINITY)).collect();
        let locks = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer,
            locks,
        }
    }

    /// Resets every sample to `color` and `depth`.
    pub fn clear(&mut self, color: Vector3<f32>, depth: f32) {
        self.color_buffer.get_mut().par_iter_mut().for_each(|c| *c = color);
        self.depth_buffer
            .par_iter()
            .for_each(|d| d.store(depth, Ordering::Relaxed));
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Thread-safe depth test and update.
    /// Returns true if the new depth is closer than the existing value.
    /// If true, it updates the depth buffer atomically.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.depth_buffer[self.index(x, y)]
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |current| {
                (new_depth < current).then_some(new_depth)
            })
            .is_ok()
    }

    /// Thread-safe pixel write.
    /// With depth testing enabled, call only after `depth_test_and_update` returned true.
    #[inline]
    pub fn set_pixel_safe(&self, x: usize, y: usize, color: Vector3<f32>) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);

            let lock_idx = idx % self.locks.len();
            let _guard = match self.locks[lock_idx].lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            // SAFETY: we hold the lock for this stripe of pixels.
            unsafe {
                let buffer = &mut *self.color_buffer.get();
                buffer[idx] = color;
            }
        }
    }

    /// Raw depth of one sample.
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        self.in_bounds(x, y)
            .then(|| self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed))
    }

    /// Resolved (sample-averaged) color of one output pixel.
    /// Only meaningful once rendering into this buffer has finished.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // SAFETY: no draw call is in flight while `&self` is used for reading.
        let buffer = unsafe { &*self.color_buffer.get() };

        if self.sample_count == 1 {
            return Some(buffer[self.index(x, y)]);
        }

        let mut sum_color = Vector3::zeros();
        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;

        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum_color += buffer[self.index(start_x + dx, start_y + dy)];
            }
        }

        let samples = (self.sample_count * self.sample_count) as f32;
        Some(sum_color / samples)
    }

    /// Copies the raw color samples out, row-major, `buffer_width` per row.
    pub fn color_samples(&mut self) -> Vec<Vector3<f32>> {
        self.color_buffer.get_mut().clone()
    }

    /// Copies the raw depth samples out, row-major, `buffer_width` per row.
    pub fn depth_samples(&self) -> Vec<f32> {
        self.depth_buffer
            .iter()
            .map(|d| d.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_keeps_the_closest_value() {
        let fb = FrameBuffer::new(4, 4, 1);
        assert!(fb.depth_test_and_update(1, 1, 0.5));
        assert!(!fb.depth_test_and_update(1, 1, 0.7));
        assert!(fb.depth_test_and_update(1, 1, 0.2));
        assert_eq!(fb.depth_at(1, 1), Some(0.2));
        assert!(!fb.depth_test_and_update(9, 9, 0.0));
    }

    #[test]
    fn clear_resets_color_and_depth() {
        let mut fb = FrameBuffer::new(2, 2, 1);
        fb.depth_test_and_update(0, 0, 0.1);
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 0.0, 0.0));

        fb.clear(Vector3::new(0.1, 0.1, 0.1), 1.0);

        assert_eq!(fb.get_pixel(0, 0), Some(Vector3::new(0.1, 0.1, 0.1)));
        assert_eq!(fb.depth_at(0, 0), Some(1.0));
    }

    #[test]
    fn get_pixel_averages_supersamples() {
        let fb = FrameBuffer::new(1, 1, 2);
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 1.0, 1.0));
        fb.set_pixel_safe(1, 1, Vector3::new(1.0, 1.0, 1.0));
        let px = fb.get_pixel(0, 0).unwrap();
        assert!((px.x - 0.5).abs() < 1e-6);
        assert_eq!(fb.get_pixel(1, 0), None);
    }
}
