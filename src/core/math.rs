pub mod interpolation;
pub mod intersect;
pub mod optics;
pub mod transform;
