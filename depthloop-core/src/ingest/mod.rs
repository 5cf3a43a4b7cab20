//! Camera interface
//!
//! Everything the pipelines need to know about a depth camera:
//! - Open-time and per-grab parameters
//! - The `DepthCamera` trait and its error types
//! - Retrieved measurements (images, depth maps, point clouds)
//! - Tracking and spatial mapping parameters and status

pub mod camera;
pub mod mapping;
pub mod measure;
pub mod params;

#[cfg(test)]
pub(crate) mod scripted;

pub use camera::{DepthCamera, DeviceError, ErrorCode, GrabStatus};
pub use mapping::{
    MappingRange, MappingResolution, MappingState, Pose, PositionalTrackingParameters,
    SpatialMappingParameters,
};
pub use measure::{
    DepthMap, Grid, MeasureKind, MeasureRequest, Measurement, PointCloudMap, PointSample, View,
};
pub use params::{
    CoordinateSystem, DepthMode, InitParameters, Resolution, RuntimeParameters,
    SensingMode, Unit,
};
