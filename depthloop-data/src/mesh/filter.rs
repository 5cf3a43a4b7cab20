//! Mesh clean-up after extraction.

use super::Mesh;
use glam::{IVec3, Vec3};
use std::collections::HashMap;
use strum::{Display, EnumString};
use tracing::debug;

/// Area below which a triangle is considered degenerate.
const DEGENERATE_AREA: f32 = 1e-12;

/// Strength of the mesh filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MeshFilter {
    /// Merge coincident vertices, drop degenerate faces and unused vertices.
    #[default]
    Low,
    /// `Low`, plus weld vertices closer than 10% of the mean edge length.
    Medium,
    /// `Medium` with a 25% weld, plus dropping faces whose longest edge is
    /// more than four times the mean edge length.
    High,
}

impl MeshFilter {
    fn weld_ratio(self) -> f32 {
        match self {
            MeshFilter::Low => 0.0,
            MeshFilter::Medium => 0.10,
            MeshFilter::High => 0.25,
        }
    }

    fn long_edge_ratio(self) -> Option<f32> {
        match self {
            MeshFilter::High => Some(4.0),
            _ => None,
        }
    }
}

/// Before/after counts of a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub triangles_before: usize,
    pub triangles_after: usize,
}

pub(super) fn apply(mesh: &mut Mesh, level: MeshFilter) -> FilterStats {
    let vertices_before = mesh.vertex_count();
    let triangles_before = mesh.triangle_count();
    // Tolerances are relative to the mesh as extracted, before any welding.
    let mean_edge = mesh.mean_edge_length().unwrap_or(0.0);

    weld_vertices(mesh, mean_edge * level.weld_ratio());
    drop_degenerate_triangles(mesh);
    if let Some(ratio) = level.long_edge_ratio() {
        if mean_edge > 0.0 {
            drop_long_triangles(mesh, mean_edge * ratio);
        }
    }
    drop_unreferenced_vertices(mesh);
    mesh.compute_normals();

    FilterStats {
        vertices_before,
        vertices_after: mesh.vertex_count(),
        triangles_before,
        triangles_after: mesh.triangle_count(),
    }
}

/// Merge vertices and point triangles at the survivors.
///
/// A zero tolerance merges bit-identical positions only. Otherwise each vertex
/// merges onto the closest earlier survivor no farther than `tolerance`.
fn weld_vertices(mesh: &mut Mesh, tolerance: f32) {
    let remap = if tolerance > 0.0 {
        weld_within(&mesh.vertices, tolerance)
    } else {
        weld_exact(&mesh.vertices)
    };

    let merged = remap.iter().enumerate().filter(|(i, r)| i != *r).count();
    debug!("Welded {} vertices (tolerance {})", merged, tolerance);

    for tri in &mut mesh.triangles {
        *tri = tri.map(|i| remap[i]);
    }
}

fn weld_exact(vertices: &[Vec3]) -> Vec<usize> {
    let mut survivors: HashMap<[u32; 3], usize> = HashMap::with_capacity(vertices.len());
    vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            // +0.0 and -0.0 must share a key.
            let p = *v + Vec3::ZERO;
            *survivors
                .entry([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
                .or_insert(i)
        })
        .collect()
}

/// Cells are `tolerance` wide, so every candidate lies in one of the 27
/// cells around the vertex.
fn weld_within(vertices: &[Vec3], tolerance: f32) -> Vec<usize> {
    let mut cells: HashMap<IVec3, Vec<usize>> = HashMap::new();
    let mut remap = Vec::with_capacity(vertices.len());

    for (i, &p) in vertices.iter().enumerate() {
        let cell = (p / tolerance).floor().as_ivec3();
        let closest = (-1..=1)
            .flat_map(|x| (-1..=1).flat_map(move |y| (-1..=1).map(move |z| IVec3::new(x, y, z))))
            .filter_map(|offset| cells.get(&(cell + offset)))
            .flatten()
            .map(|&survivor| (survivor, vertices[survivor].distance(p)))
            .filter(|&(_, distance)| distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        match closest {
            Some((survivor, _)) => remap.push(survivor),
            None => {
                cells.entry(cell).or_default().push(i);
                remap.push(i);
            }
        }
    }
    remap
}

fn drop_degenerate_triangles(mesh: &mut Mesh) {
    let vertices = &mesh.vertices;
    let before = mesh.triangles.len();
    mesh.triangles.retain(|&[a, b, c]| {
        if a == b || b == c || a == c {
            return false;
        }
        let area = (vertices[b] - vertices[a]).cross(vertices[c] - vertices[a]).length() * 0.5;
        area > DEGENERATE_AREA
    });
    debug!("Dropped {} degenerate triangles", before - mesh.triangles.len());
}

fn drop_long_triangles(mesh: &mut Mesh, max_edge: f32) {
    let vertices = &mesh.vertices;
    let before = mesh.triangles.len();
    mesh.triangles.retain(|tri| {
        let [a, b, c] = tri.map(|i| vertices[i]);
        a.distance(b).max(b.distance(c)).max(c.distance(a)) <= max_edge
    });
    debug!(
        "Dropped {} triangles with an edge over {}",
        before - mesh.triangles.len(),
        max_edge
    );
}

fn drop_unreferenced_vertices(mesh: &mut Mesh) {
    let mut new_index = vec![usize::MAX; mesh.vertices.len()];
    let mut next = 0;
    for tri in &mesh.triangles {
        for &i in tri {
            if new_index[i] == usize::MAX {
                new_index[i] = next;
                next += 1;
            }
        }
    }

    let mut order = vec![0; next];
    for (old, &new) in new_index.iter().enumerate() {
        if new != usize::MAX {
            order[new] = old;
        }
    }

    mesh.vertices = order.iter().map(|&old| mesh.vertices[old]).collect();
    if mesh.colors.len() == new_index.len() {
        mesh.colors = order.iter().map(|&old| mesh.colors[old]).collect();
    } else {
        mesh.colors.clear();
    }
    mesh.normals.clear();
    for tri in &mut mesh.triangles {
        *tri = tri.map(|i| new_index[i]);
    }
}
