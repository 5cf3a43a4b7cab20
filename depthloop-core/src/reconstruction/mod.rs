//! Incremental map building
//!
//! Camera implementations that do their own spatial mapping fuse each grabbed
//! frame into a [`VoxelMap`] and extract it as a mesh on request.

pub mod voxel_map;

pub use voxel_map::{BYTES_PER_VOXEL, VoxelMap};
