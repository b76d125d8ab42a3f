use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

pub const MIN_PITCH: f32 = -89.0;
pub const MAX_PITCH: f32 = 89.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 60.0;

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 3.0;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 50.0;

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// The state `reset` returns to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDefaults {
    pub position: Point3<f32>,
    pub speed: f32,
    pub sensitivity: f32,
    pub zoom: f32,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Euler-angle fly camera. Manages the View and Projection matrices.
///
/// Angles are in degrees. `front`, `right` and `up` are derived from yaw and
/// pitch and always form an orthonormal basis.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub world_up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,

    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub zoom_enabled: bool,
    /// When set, the camera stays at this height whatever the movement.
    pub fixed_height: Option<f32>,

    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,

    defaults: CameraDefaults,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraDefaults::default())
    }
}

impl Camera {
    pub fn new(defaults: CameraDefaults) -> Self {
        let mut cam = Self {
            position: defaults.position,
            world_up: Vector3::y(),
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            speed: defaults.speed,
            sensitivity: defaults.sensitivity,
            zoom: defaults.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            zoom_enabled: false,
            fixed_height: None,
            front: -Vector3::z(),
            right: Vector3::x(),
            up: Vector3::y(),
            defaults,
        };
        cam.update_vectors();
        cam
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Moves `speed * dt` along the requested basis vector.
    pub fn apply_movement(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.speed * dt;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Right => self.right,
            CameraMovement::Left => -self.right,
            CameraMovement::Up => self.up,
            CameraMovement::Down => -self.up,
        };
        self.position += offset * velocity;

        if let Some(y) = self.fixed_height {
            self.position.y = y;
        }
    }

    /// Turns by the mouse offsets (pixels). Positive `dy` looks up.
    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(MIN_PITCH, MAX_PITCH);
        self.update_vectors();
    }

    /// Narrows the field of view by `dy` degrees. Ignored while zoom is disabled.
    pub fn apply_zoom(&mut self, dy: f32) {
        if self.zoom_enabled {
            self.zoom = (self.zoom - dy).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Restores position, speed, sensitivity and zoom. The view direction is kept.
    pub fn reset(&mut self) {
        self.position = self.defaults.position;
        self.speed = self.defaults.speed;
        self.sensitivity = self.defaults.sensitivity;
        self.zoom = self.defaults.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position, &(self.position + self.front), &self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        TransformFactory::perspective(aspect_ratio, self.zoom.to_radians(), NEAR_PLANE, FAR_PLANE)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        // Pitch stays below 90 degrees, so front is never parallel to world up.
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}
