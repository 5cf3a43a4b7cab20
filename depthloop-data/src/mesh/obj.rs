//! Wavefront OBJ export.

use super::{Mesh, MeshError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub(super) fn save_obj(mesh: &Mesh, path: &Path) -> Result<(), MeshError> {
    let file = File::create(path)?;
    write_obj(mesh, BufWriter::new(file))
}

/// Indices are written 1-based. Vertex colors use the common `v x y z r g b`
/// extension.
pub(super) fn write_obj<W: Write>(mesh: &Mesh, mut out: W) -> Result<(), MeshError> {
    writeln!(
        out,
        "# depthloop mesh: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;

    let with_colors = mesh.has_colors();
    for (i, v) in mesh.vertices.iter().enumerate() {
        if with_colors {
            let c = mesh.colors[i];
            writeln!(out, "v {} {} {} {} {} {}", v.x, v.y, v.z, c.x, c.y, c.z)?;
        } else {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
    }

    let with_normals = mesh.has_normals();
    if with_normals {
        for n in &mesh.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| i + 1);
        if with_normals {
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(out, "f {a} {b} {c}")?;
        }
    }

    out.flush()?;
    Ok(())
}
