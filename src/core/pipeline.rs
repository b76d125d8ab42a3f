use crate::core::geometry::Vertex;
use crate::core::texture::TextureUnits;
use log::warn;
use nalgebra::{Matrix4, Point2, Vector3, Vector4};
use std::ops::{Add, Mul};
use thiserror::Error;

/// Trait for types that can be linearly interpolated across a triangle's surface.
///
/// Requirements:
/// - Copy + Clone: cheaply duplicable values for per-vertex storage and interpolation.
/// - Add + Mul<f32>: support linear combination (a + b * t) used by barycentric interpolation.
/// - Send + Sync: safe to use from multiple threads during parallel rasterization.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl Interpolatable for Vector3<f32> {}

/// Per-fragment built-ins handed to the fragment stage.
#[derive(Debug, Clone, Copy)]
pub struct FragmentInput {
    /// Window position normalized to [0, 1], origin at the top-left corner.
    pub screen_uv: Point2<f32>,
    /// Window-space depth in [0, 1].
    pub depth: f32,
}

/// Shader represents the programmable stages of the pipeline.
///
/// Implementations must be thread-safe (Send + Sync) because shading may be invoked
/// concurrently across fragments.
pub trait Shader: Send + Sync {
    /// Per-vertex varying data to be interpolated and provided to the fragment shader.
    type Varying: Interpolatable;

    /// Transforms the vertex into homogeneous clip space and returns the varying
    /// associated with it.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Computes the value written to the color attachment for one fragment.
    ///
    /// Samplers resolve their texture through `units`, the bindings active at
    /// draw time.
    fn fragment(
        &self,
        varying: Self::Varying,
        input: &FragmentInput,
        units: &TextureUnits,
    ) -> Vector3<f32>;
}

/// A value assignable to a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Bool(bool),
    Int(i32),
    Mat4(Matrix4<f32>),
}

impl Uniform {
    pub fn type_name(&self) -> &'static str {
        match self {
            Uniform::Float(_) => "float",
            Uniform::Bool(_) => "bool",
            Uniform::Int(_) => "int",
            Uniform::Mat4(_) => "mat4",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UniformError {
    #[error("program '{program}' has no uniform named '{name}'")]
    Unknown { program: &'static str, name: String },
    #[error("uniform '{name}' of program '{program}' expects {expected}, got {actual}")]
    TypeMismatch {
        program: &'static str,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl UniformError {
    pub fn mismatch(program: &'static str, name: &str, expected: &'static str, got: Uniform) -> Self {
        UniformError::TypeMismatch {
            program,
            name: name.to_string(),
            expected,
            actual: got.type_name(),
        }
    }

    pub fn unknown(program: &'static str, name: &str) -> Self {
        UniformError::Unknown {
            program,
            name: name.to_string(),
        }
    }
}

/// A linked program whose uniforms are addressed by name.
///
/// The typed setters mirror a graphics API: a bad name or type is reported
/// and otherwise ignored.
pub trait Program {
    /// Name used in diagnostics.
    fn label(&self) -> &'static str;

    fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), UniformError>;

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_or_warn(name, Uniform::Float(value));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_or_warn(name, Uniform::Bool(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_or_warn(name, Uniform::Int(value));
    }

    fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.set_or_warn(name, Uniform::Mat4(*value));
    }

    fn set_or_warn(&mut self, name: &str, value: Uniform) {
        if let Err(e) = self.set_uniform(name, value) {
            warn!("{}", e);
        }
    }
}

/// Reads a texture unit index from an int uniform.
pub(crate) fn sampler_unit(
    program: &'static str,
    name: &str,
    value: Uniform,
) -> Result<usize, UniformError> {
    match value {
        Uniform::Int(unit) if unit >= 0 => Ok(unit as usize),
        Uniform::Int(_) => Err(UniformError::mismatch(program, name, "texture unit >= 0", value)),
        other => Err(UniformError::mismatch(program, name, "int", other)),
    }
}

/// Model, view and projection matrices shared by every mesh program.
#[derive(Debug, Clone, Copy)]
pub struct Transforms {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Default for Transforms {
    fn default() -> Self {
        Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }
}

impl Transforms {
    /// Handles the `model`, `view` and `projection` uniforms.
    /// Returns `Ok(false)` when `name` is not one of them.
    pub fn set(
        &mut self,
        program: &'static str,
        name: &str,
        value: Uniform,
    ) -> Result<bool, UniformError> {
        let slot = match name {
            "model" => &mut self.model,
            "view" => &mut self.view,
            "projection" => &mut self.projection,
            _ => return Ok(false),
        };
        match value {
            Uniform::Mat4(m) => {
                *slot = m;
                Ok(true)
            }
            other => Err(UniformError::mismatch(program, name, "mat4", other)),
        }
    }

    pub fn model_view(&self) -> Matrix4<f32> {
        self.view * self.model
    }

    pub fn mvp(&self) -> Matrix4<f32> {
        self.projection * self.view * self.model
    }
}
