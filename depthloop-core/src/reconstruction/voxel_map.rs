//! Voxel fusion of posed point clouds

use crate::ingest::{MappingState, Pose, SpatialMappingParameters};
use depthloop_data::Mesh;
use glam::{IVec3, Vec3};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Approximate memory cost of one occupied voxel, hash map overhead included.
pub const BYTES_PER_VOXEL: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
struct VoxelCell {
    position_sum: Vec3,
    color_sum: Vec3,
    hits: u32,
}

impl VoxelCell {
    fn add(&mut self, position: Vec3, color: Vec3) {
        self.position_sum += position;
        self.color_sum += color;
        self.hits += 1;
    }

    fn color(&self) -> Vec3 {
        self.color_sum / self.hits as f32
    }
}

/// Faces of a unit cube: outward normal and corners in counter-clockwise order.
const CUBE_FACES: [(IVec3, [IVec3; 4]); 6] = [
    (
        IVec3::X,
        [IVec3::new(1, 0, 0), IVec3::new(1, 1, 0), IVec3::new(1, 1, 1), IVec3::new(1, 0, 1)],
    ),
    (
        IVec3::NEG_X,
        [IVec3::new(0, 0, 0), IVec3::new(0, 0, 1), IVec3::new(0, 1, 1), IVec3::new(0, 1, 0)],
    ),
    (
        IVec3::Y,
        [IVec3::new(0, 1, 0), IVec3::new(0, 1, 1), IVec3::new(1, 1, 1), IVec3::new(1, 1, 0)],
    ),
    (
        IVec3::NEG_Y,
        [IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(1, 0, 1), IVec3::new(0, 0, 1)],
    ),
    (
        IVec3::Z,
        [IVec3::new(0, 0, 1), IVec3::new(1, 0, 1), IVec3::new(1, 1, 1), IVec3::new(0, 1, 1)],
    ),
    (
        IVec3::NEG_Z,
        [IVec3::new(0, 0, 0), IVec3::new(0, 1, 0), IVec3::new(1, 1, 0), IVec3::new(1, 0, 0)],
    ),
];

/// Accumulates world-space points into a sparse voxel grid.
///
/// Each frame's points are given in the camera frame (meters, right-handed
/// Y-up) together with the camera pose. Points beyond the mapping range are
/// ignored. Once the memory budget is used up, the state turns to
/// `NotEnoughMemory`. Existing voxels still fuse new points, but no new
/// voxels are created.
#[derive(Debug)]
pub struct VoxelMap {
    params: SpatialMappingParameters,
    budget_bytes: usize,
    voxels: HashMap<IVec3, VoxelCell>,
    frames: u64,
    dropped_points: u64,
}

impl VoxelMap {
    pub fn new(params: SpatialMappingParameters) -> Self {
        Self {
            params,
            budget_bytes: params.max_memory_usage_mb as usize * 1024 * 1024,
            voxels: HashMap::new(),
            frames: 0,
            dropped_points: 0,
        }
    }

    /// Override the memory budget in bytes.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.budget_bytes = bytes;
        self
    }

    pub fn params(&self) -> &SpatialMappingParameters {
        &self.params
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Points rejected because the budget was exhausted.
    pub fn dropped_points(&self) -> u64 {
        self.dropped_points
    }

    pub fn memory_usage(&self) -> usize {
        self.voxels.len() * BYTES_PER_VOXEL
    }

    fn is_full(&self) -> bool {
        self.memory_usage() >= self.budget_bytes
    }

    pub fn state(&self) -> MappingState {
        if self.frames == 0 {
            MappingState::Initializing
        } else if self.is_full() {
            MappingState::NotEnoughMemory
        } else {
            MappingState::Ok
        }
    }

    fn voxel_key(&self, world: Vec3) -> IVec3 {
        (world / self.params.resolution_meter).floor().as_ivec3()
    }

    /// Fuse one frame of points.
    pub fn integrate<I>(&mut self, pose: &Pose, points: I)
    where
        I: IntoIterator<Item = (Vec3, Vec3)>,
    {
        let before = self.voxels.len();
        let mut accepted = 0usize;

        for (local, color) in points {
            if !local.is_finite() || local.length() > self.params.range_meter {
                continue;
            }
            let world = pose.transform_point(local);
            let key = self.voxel_key(world);

            if let Some(cell) = self.voxels.get_mut(&key) {
                cell.add(world, color);
            } else if self.is_full() {
                self.dropped_points += 1;
                continue;
            } else {
                self.voxels.entry(key).or_default().add(world, color);
            }
            accepted += 1;
        }

        self.frames += 1;
        debug!(
            "Integrated frame {}: {} points, {} new voxels ({} total)",
            self.frames,
            accepted,
            self.voxels.len() - before,
            self.voxels.len()
        );
        if self.is_full() && self.dropped_points > 0 {
            warn!(
                "Spatial map is over its memory budget, {} points dropped so far",
                self.dropped_points
            );
        }
    }

    /// Build a surface mesh from the occupied voxels.
    ///
    /// Every voxel face that borders an empty voxel becomes a quad. Corners are
    /// emitted per face, so neighboring quads duplicate their shared corners
    /// until the mesh is filtered. Vertex colors are the voxel's mean color.
    pub fn extract_mesh(&self) -> Mesh {
        // Sorted so extraction is deterministic.
        let voxels: BTreeMap<[i32; 3], &VoxelCell> =
            self.voxels.iter().map(|(k, v)| (k.to_array(), v)).collect();
        let resolution = self.params.resolution_meter;

        let mut vertices = Vec::new();
        let mut colors = Vec::new();
        let mut triangles = Vec::new();

        for (key, cell) in &voxels {
            let key = IVec3::from_array(*key);
            let color = cell.color();
            for (normal, corners) in &CUBE_FACES {
                if self.voxels.contains_key(&(key + *normal)) {
                    continue;
                }
                let start = vertices.len();
                for corner in corners {
                    vertices.push((key + *corner).as_vec3() * resolution);
                    colors.push(color);
                }
                triangles.push([start, start + 1, start + 2]);
                triangles.push([start, start + 2, start + 3]);
            }
        }

        debug!(
            "Extracted {} triangles from {} voxels",
            triangles.len(),
            voxels.len()
        );
        Mesh::from_parts(vertices, triangles).with_colors(colors)
    }

    /// Mean position of the points fused into each voxel.
    pub fn centroids(&self) -> Vec<Vec3> {
        self.voxels
            .values()
            .map(|cell| cell.position_sum / cell.hits as f32)
            .collect()
    }
}
