use crate::core::geometry::Vertex;
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;

/// A collection of vertices and indices representing one part of a model.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Sub-object name from the source file, may be empty.
    pub name: String,
    /// List of vertices.
    pub vertices: Vec<Vertex>,
    /// List of indices defining triangles (3 indices per triangle).
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the triangles as vertex index triples, skipping any that
    /// reference a vertex out of range.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let n = self.vertices.len();
        self.indices
            .chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .filter(move |t| t.iter().all(|&i| i < n))
    }

    /// Creates a single counter-clockwise triangle facing +Z.
    pub fn create_test_triangle() -> Self {
        let normal = Vector3::z();
        let vertices = vec![
            Vertex::new(Point3::new(0.0, 0.5, 0.0), normal, 0.0),
            Vertex::new(Point3::new(-0.5, -0.5, 0.0), normal, 0.0),
            Vertex::new(Point3::new(0.5, -0.5, 0.0), normal, 0.0),
        ];
        Self::new("triangle", vertices, vec![0, 1, 2])
    }

    /// Creates a UV sphere centered at the origin with outward normals and
    /// counter-clockwise winding seen from outside. d_N is left at zero.
    pub fn create_uv_sphere(radius: f32, stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let phi = PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let theta = 2.0 * PI * j as f32 / slices as f32;
                let normal = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex::new(Point3::from(normal * radius), normal, 0.0));
            }
        }

        let row = slices + 1;
        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                for tri in [[a, b, a + 1], [a + 1, b, b + 1]] {
                    push_outward(&vertices, &mut indices, tri);
                }
            }
        }

        Self::new("sphere", vertices, indices)
    }
}

/// Appends `tri` wound so its geometric normal points away from the origin.
/// Triangles collapsed at the poles are dropped.
fn push_outward(vertices: &[Vertex], indices: &mut Vec<u32>, [a, b, c]: [u32; 3]) {
    let pa = vertices[a as usize].position;
    let pb = vertices[b as usize].position;
    let pc = vertices[c as usize].position;

    let face_normal = (pb - pa).cross(&(pc - pa));
    if face_normal.norm_squared() < 1e-12 {
        return;
    }
    let centroid = (pa.coords + pb.coords + pc.coords) / 3.0;
    if face_normal.dot(&centroid) >= 0.0 {
        indices.extend_from_slice(&[a, b, c]);
    } else {
        indices.extend_from_slice(&[a, c, b]);
    }
}

/// Smooth per-vertex normals: the area-weighted sum of the adjacent face
/// normals, normalized. Vertices touched by no triangle get +Y.
pub fn compute_smooth_normals(positions: &[Point3<f32>], indices: &[u32]) -> Vec<Vector3<f32>> {
    let mut normals = vec![Vector3::zeros(); positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        // The cross product's length is twice the area, which is the weight.
        let face = (positions[i1] - positions[i0]).cross(&(positions[i2] - positions[i0]));
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    normals
        .into_iter()
        .map(|n| n.try_normalize(1e-12).unwrap_or_else(Vector3::y))
        .collect()
}
