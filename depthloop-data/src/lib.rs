//! Depthloop Data Crate
//!
//! CPU-side geometry for the mapping pipeline: the triangle [`Mesh`] produced
//! by spatial mapping, the [`MeshFilter`] clean-up pass, and Wavefront OBJ
//! export. This crate knows nothing about cameras.

pub mod mesh;

pub use mesh::{FilterStats, Mesh, MeshError, MeshFilter};
