//! Triangle meshes built by spatial mapping.

mod filter;
mod obj;

use glam::Vec3;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub use filter::{FilterStats, MeshFilter};

/// Errors that can occur while processing or saving a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    #[error("Mesh is empty")]
    Empty,
}

/// An indexed triangle mesh.
///
/// `normals` and `colors` are either empty or hold exactly one entry per
/// vertex. Triangles index into `vertices` and are wound counter-clockwise
/// when seen from outside the surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// RGB color (linear, 0-1 range).
    pub colors: Vec<Vec3>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from positions and triangle indices.
    pub fn from_parts(vertices: Vec<Vec3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            normals: Vec::new(),
            colors: Vec::new(),
            triangles,
        }
    }

    /// Attach one color per vertex.
    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(colors.len(), self.vertices.len());
        self.colors = colors;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty() && self.colors.len() == self.vertices.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    /// Recompute per-vertex normals as the area-weighted average of the
    /// adjacent face normals.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| self.vertices[i]);
            // Unnormalized cross product is already weighted by area.
            let face = (b - a).cross(c - a);
            for &i in tri {
                normals[i] += face;
            }
        }
        self.normals = normals.into_iter().map(Vec3::normalize_or_zero).collect();
    }

    /// Mean length of all triangle edges, or `None` when there are no triangles.
    pub fn mean_edge_length(&self) -> Option<f32> {
        if self.triangles.is_empty() {
            return None;
        }
        let total: f32 = self
            .triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.map(|i| self.vertices[i]);
                a.distance(b) + b.distance(c) + c.distance(a)
            })
            .sum();
        Some(total / (self.triangles.len() * 3) as f32)
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), v| (min.min(*v), max.max(*v))),
        )
    }

    /// Clean up the mesh in place. See [`MeshFilter`] for what each level does.
    pub fn filter(&mut self, level: MeshFilter) -> FilterStats {
        let stats = filter::apply(self, level);
        info!(
            "Filtered mesh ({:?}): {} -> {} vertices, {} -> {} triangles",
            level,
            stats.vertices_before,
            stats.vertices_after,
            stats.triangles_before,
            stats.triangles_after
        );
        stats
    }

    /// Save the mesh to disk. The format is chosen from the file extension;
    /// only Wavefront OBJ (`.obj`) is supported.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MeshError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension != "obj" {
            return Err(MeshError::UnsupportedFormat(extension));
        }
        if self.is_empty() {
            return Err(MeshError::Empty);
        }

        debug!(
            "Writing {} vertices and {} triangles",
            self.vertex_count(),
            self.triangle_count()
        );
        obj::save_obj(self, path)?;
        info!("Mesh saved");
        Ok(())
    }

    /// Write the mesh as Wavefront OBJ text.
    pub fn write_obj<W: std::io::Write>(&self, writer: W) -> Result<(), MeshError> {
        obj::write_obj(self, writer)
    }
}
