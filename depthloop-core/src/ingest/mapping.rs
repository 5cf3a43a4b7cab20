//! Positional tracking and spatial mapping parameters and status.

use glam::{Quat, Vec3};
use std::fmt;

/// Camera pose in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Map a point from the camera frame into the world frame.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }

    /// Map a point from the world frame into the camera frame.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionalTrackingParameters {
    /// Where the camera starts in the world frame, in meters.
    pub initial_position: Vec3,
}

/// Preset voxel sizes for spatial mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingResolution {
    High,
    #[default]
    Medium,
    Low,
}

impl MappingResolution {
    pub fn meters(self) -> f32 {
        match self {
            MappingResolution::High => 0.02,
            MappingResolution::Medium => 0.05,
            MappingResolution::Low => 0.08,
        }
    }
}

/// Preset integration depth for spatial mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingRange {
    #[default]
    Short,
    Medium,
    Long,
}

impl MappingRange {
    pub fn meters(self) -> f32 {
        match self {
            MappingRange::Short => 3.5,
            MappingRange::Medium => 5.0,
            MappingRange::Long => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMappingParameters {
    /// Voxel edge length in meters.
    pub resolution_meter: f32,
    /// Points farther than this from the camera are not integrated.
    pub range_meter: f32,
    /// Memory the map may use before integration stops.
    pub max_memory_usage_mb: u32,
}

impl SpatialMappingParameters {
    pub fn new(resolution: MappingResolution, range: MappingRange) -> Self {
        Self {
            resolution_meter: resolution.meters(),
            range_meter: range.meters(),
            max_memory_usage_mb: 2048,
        }
    }

    pub fn with_max_memory_mb(mut self, mb: u32) -> Self {
        self.max_memory_usage_mb = mb;
        self
    }
}

impl Default for SpatialMappingParameters {
    fn default() -> Self {
        Self::new(MappingResolution::default(), MappingRange::default())
    }
}

/// Health of the spatial mapping process.
///
/// It is only reported. The acquisition loop never changes course because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Initializing,
    Ok,
    NotEnoughMemory,
    NotEnabled,
    FpsTooLow,
}

impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingState::Initializing => "INITIALIZING",
            MappingState::Ok => "OK",
            MappingState::NotEnoughMemory => "NOT_ENOUGH_MEMORY",
            MappingState::NotEnabled => "NOT_ENABLED",
            MappingState::FpsTooLow => "FPS_TOO_LOW",
        })
    }
}
