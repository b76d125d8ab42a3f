use crate::scene::selection::Selection;
use log::info;

pub const DEFAULT_BENCHMARK_FRAMES: u32 = 1000;

/// Frame-rate sampler started from the panel. Collects 1/dt for a fixed
/// number of frames, then logs a summary and switches itself off.
#[derive(Debug, Clone, Default)]
pub struct FpsBenchmark {
    active: bool,
    target_frames: u32,
    frames: u32,
    min_fps: f32,
    max_fps: f32,
    total_fps: f32,
}

impl FpsBenchmark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, frames: u32, selection: &Selection) {
        *self = Self {
            active: frames > 0,
            target_frames: frames,
            min_fps: f32::MAX,
            max_fps: 0.0,
            ..Self::default()
        };
        info!(
            "FPS test started: {} frames, model {}, {} refraction, skybox {}, IOR {:.3}, \
             reflect {}, d_V only {}, spin {}, zoom in {}",
            frames,
            selection.model.label(),
            selection.refraction.label(),
            selection.skybox.label(),
            selection.ior,
            selection.reflect,
            selection.dv_only,
            selection.spin,
            selection.zoom_in,
        );
    }

    /// Feeds one frame time in seconds. Non-positive times are skipped.
    pub fn update(&mut self, dt: f32) {
        if !self.active || dt <= 0.0 {
            return;
        }
        let fps = 1.0 / dt;
        self.min_fps = self.min_fps.min(fps);
        self.max_fps = self.max_fps.max(fps);
        self.total_fps += fps;
        self.frames += 1;

        if self.frames >= self.target_frames {
            self.active = false;
            info!(
                "FPS test finished: {} frames, min {:.1}, max {:.1}, average {:.1}",
                self.frames,
                self.min_fps,
                self.max_fps,
                self.average()
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn average(&self) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_fps / self.frames as f32
        }
    }

    /// `None` until the first sample.
    pub fn min(&self) -> Option<f32> {
        (self.frames > 0).then_some(self.min_fps)
    }

    pub fn max(&self) -> Option<f32> {
        (self.frames > 0).then_some(self.max_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_zero_without_samples() {
        let mut bench = FpsBenchmark::new();
        assert_eq!(bench.average(), 0.0);
        bench.start(10, &Selection::default());
        assert!(bench.is_active());
        assert_eq!(bench.average(), 0.0);
        assert_eq!(bench.min(), None);
    }

    #[test]
    fn stops_after_the_requested_frames() {
        let mut bench = FpsBenchmark::new();
        bench.start(3, &Selection::default());
        bench.update(0.5);
        bench.update(0.25);
        assert!(bench.is_active());
        bench.update(0.1);
        assert!(!bench.is_active());

        assert_eq!(bench.frames(), 3);
        assert_eq!(bench.min(), Some(2.0));
        assert!((bench.max().unwrap() - 10.0).abs() < 1e-4);
        assert!((bench.average() - 16.0 / 3.0).abs() < 1e-4);

        // Inactive benchmarks ignore further frames.
        bench.update(0.01);
        assert_eq!(bench.frames(), 3);
    }

    #[test]
    fn restart_discards_previous_samples() {
        let mut bench = FpsBenchmark::new();
        bench.start(2, &Selection::default());
        bench.update(0.5);
        bench.start(2, &Selection::default());
        assert_eq!(bench.frames(), 0);
        bench.update(0.0);
        assert_eq!(bench.frames(), 0);
    }
}
