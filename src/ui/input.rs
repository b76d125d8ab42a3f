use crate::scene::camera::{Camera, CameraMovement};
use egui::{Event, Key};

/// Keys and mouse motion sampled from one egui frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Movement keys held this frame.
    pub movement: Vec<CameraMovement>,
    /// Mouse motion in points, y down.
    pub mouse_delta: (f32, f32),
    /// Vertical scroll in points, positive away from the user.
    pub scroll: f32,
    pub toggle_capture: bool,
    pub reset: bool,
    pub exit: bool,
}

const MOVEMENT_KEYS: [(Key, CameraMovement); 6] = [
    (Key::W, CameraMovement::Forward),
    (Key::S, CameraMovement::Backward),
    (Key::A, CameraMovement::Left),
    (Key::D, CameraMovement::Right),
    (Key::Q, CameraMovement::Up),
    (Key::E, CameraMovement::Down),
];

impl FrameInput {
    pub fn gather(ctx: &egui::Context) -> Self {
        ctx.input(|i| {
            let movement = MOVEMENT_KEYS
                .iter()
                .filter(|(key, _)| i.key_down(*key))
                .map(|&(_, movement)| movement)
                .collect();

            // Raw motion keeps working while the cursor is grabbed.
            let mut raw = None;
            for event in &i.raw.events {
                if let Event::MouseMoved(delta) = event {
                    let (x, y) = raw.unwrap_or((0.0, 0.0));
                    raw = Some((x + delta.x, y + delta.y));
                }
            }
            let pointer = i.pointer.delta();

            Self {
                movement,
                mouse_delta: raw.unwrap_or((pointer.x, pointer.y)),
                scroll: i.raw_scroll_delta.y,
                toggle_capture: i.key_pressed(Key::I),
                reset: i.key_pressed(Key::R),
                exit: i.key_pressed(Key::Escape),
            }
        })
    }
}

/// What the window has to do after the camera took its input. Reset covers
/// the model spin too, so it is left to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputResponse {
    /// New capture state when it changed this frame.
    pub capture_changed: Option<bool>,
    pub reset: bool,
    pub exit: bool,
}

/// Routes keyboard and mouse input to the camera.
///
/// While the mouse is captured it turns the camera; otherwise it belongs to
/// the panel. Movement keys and scrolling work in both modes.
#[derive(Debug, Clone)]
pub struct CameraController {
    captured: bool,
    /// Zoom degrees per scrolled point.
    pub zoom_speed: f32,
}

impl CameraController {
    pub fn new(zoom_speed: f32) -> Self {
        Self {
            captured: false,
            zoom_speed,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn apply(&mut self, input: &FrameInput, camera: &mut Camera, dt: f32) -> InputResponse {
        let mut response = InputResponse {
            reset: input.reset,
            exit: input.exit,
            ..Default::default()
        };

        if input.toggle_capture {
            self.captured = !self.captured;
            response.capture_changed = Some(self.captured);
        }

        for &movement in &input.movement {
            camera.apply_movement(movement, dt);
        }

        let (dx, dy) = input.mouse_delta;
        if self.captured && (dx != 0.0 || dy != 0.0) {
            // Screen y grows downward; moving the mouse up looks up.
            camera.apply_look(dx, -dy);
        }

        if input.scroll != 0.0 {
            camera.apply_zoom(input.scroll * self.zoom_speed);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn look_needs_capture() {
        let mut controller = CameraController::new(0.02);
        let mut camera = Camera::default();
        let input = FrameInput {
            mouse_delta: (50.0, -20.0),
            ..Default::default()
        };

        controller.apply(&input, &mut camera, 0.016);
        assert_eq!(camera.yaw, -90.0);

        let toggle = FrameInput {
            toggle_capture: true,
            ..Default::default()
        };
        let response = controller.apply(&toggle, &mut camera, 0.016);
        assert_eq!(response.capture_changed, Some(true));

        controller.apply(&input, &mut camera, 0.016);
        assert!((camera.yaw - (-85.0)).abs() < 1e-4);
        // Mouse moved up the screen, so the camera looks up.
        assert!((camera.pitch - 2.0).abs() < 1e-4);
    }

    #[test]
    fn movement_keys_move_along_the_basis() {
        let mut controller = CameraController::new(0.02);
        let mut camera = Camera::default();
        let input = FrameInput {
            movement: vec![CameraMovement::Forward, CameraMovement::Up],
            ..Default::default()
        };
        controller.apply(&input, &mut camera, 1.0);
        assert!((camera.position - Point3::new(0.0, 3.0, 2.0)).norm() < 1e-4);
    }

    #[test]
    fn scroll_zooms_only_when_enabled() {
        let mut controller = CameraController::new(0.02);
        let mut camera = Camera::default();
        let input = FrameInput {
            scroll: 100.0,
            ..Default::default()
        };
        controller.apply(&input, &mut camera, 0.016);
        assert_eq!(camera.zoom, 50.0);

        camera.zoom_enabled = true;
        controller.apply(&input, &mut camera, 0.016);
        assert!((camera.zoom - 48.0).abs() < 1e-4);
    }

    #[test]
    fn reset_and_exit_are_reported() {
        let mut controller = CameraController::new(0.02);
        let mut camera = Camera::default();
        let input = FrameInput {
            reset: true,
            exit: true,
            ..Default::default()
        };
        let response = controller.apply(&input, &mut camera, 0.016);
        assert!(response.reset && response.exit);
        assert_eq!(response.capture_changed, None);
    }
}
