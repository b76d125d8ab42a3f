use crate::scene::mesh::Mesh;
use log::info;

/// A Model represents a complete 3D object.
/// It consists of one or more Meshes, drawn in order.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

/// Size counters of a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelStats {
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
}

impl Model {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
        }
    }

    /// A model with no meshes. Drawing it issues no draw calls.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            meshes: self.meshes.len(),
            vertices: self.meshes.iter().map(|m| m.vertices.len()).sum(),
            triangles: self.meshes.iter().map(Mesh::triangle_count).sum(),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Model '{}': {} meshes, {} vertices, {} triangles",
            self.name, stats.meshes, stats.vertices, stats.triangles
        );
    }
}
