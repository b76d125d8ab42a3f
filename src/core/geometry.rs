use nalgebra::{Point3, Vector3};
use std::mem::{offset_of, size_of};

/// Represents a single vertex in 3D space.
///
/// The field order is the vertex layout: every shader reads attributes by
/// the locations declared in [`Vertex::LAYOUT`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector in local object space.
    pub normal: Vector3<f32>,
    /// Precomputed distance travelled through the model along the inverted
    /// normal (d_N). Zero when the source data had none.
    pub d_n: f32,
}

/// One entry of the vertex attribute layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub name: &'static str,
    pub components: usize,
    pub offset: usize,
}

impl Vertex {
    /// Size in bytes of one vertex.
    pub const STRIDE: usize = size_of::<Vertex>();

    pub const LAYOUT: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            name: "position",
            components: 3,
            offset: offset_of!(Vertex, position),
        },
        VertexAttribute {
            location: 1,
            name: "normal",
            components: 3,
            offset: offset_of!(Vertex, normal),
        },
        VertexAttribute {
            location: 2,
            name: "d_n",
            components: 1,
            offset: offset_of!(Vertex, d_n),
        },
    ];

    pub fn new(position: Point3<f32>, normal: Vector3<f32>, d_n: f32) -> Self {
        Self {
            position,
            normal,
            d_n,
        }
    }

    /// Vertex carrying only a position, used for the skybox cube.
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z), Vector3::zeros(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed_in_declaration_order() {
        assert_eq!(Vertex::STRIDE, 7 * size_of::<f32>());

        let mut expected_offset = 0;
        for (i, attr) in Vertex::LAYOUT.iter().enumerate() {
            assert_eq!(attr.location as usize, i);
            assert_eq!(attr.offset, expected_offset, "attribute '{}'", attr.name);
            expected_offset += attr.components * size_of::<f32>();
        }
        assert_eq!(expected_offset, Vertex::STRIDE);
    }
}
