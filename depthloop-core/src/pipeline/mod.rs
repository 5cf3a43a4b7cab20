//! End-to-end capture programs
//!
//! - [`depth_sensing`]: stream frames and print the distance at the image center
//! - [`spatial_mapping`]: map the scene while tracking, then export a filtered mesh
//!
//! Both write their progress to a caller-supplied writer (stdout in the CLI)
//! and release the camera on every exit path.

pub mod depth_sensing;
pub mod spatial_mapping;

use crate::acquisition::{AcquisitionError, CameraSession, SessionError};
use crate::ingest::{DepthCamera, DeviceError, ErrorCode, InitParameters};
use depthloop_data::MeshError;
use std::io::Write;
use thiserror::Error;
use tracing::error;

pub use depth_sensing::{
    DEPTH_SENSING_REQUESTS, DepthSensingConfig, DepthSensingReport, center_distance,
    run_depth_sensing,
};
pub use spatial_mapping::{SpatialMappingConfig, SpatialMappingReport, run_spatial_mapping};

/// Errors that end a capture program.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open camera: {0}")]
    Open(ErrorCode),

    #[error("failed to enable positional tracking: {0}")]
    Tracking(#[source] DeviceError),

    #[error("failed to enable spatial mapping: {0}")]
    Mapping(#[source] DeviceError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("failed to extract spatial map: {0}")]
    Extract(#[source] DeviceError),

    #[error("failed to save mesh: {0}")]
    Save(#[from] MeshError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for failures that happen before any frame is grabbed.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            PipelineError::Open(_) | PipelineError::Tracking(_) | PipelineError::Mapping(_)
        )
    }
}

/// Open a session, printing the open failure the way the CLI reports it.
pub(crate) fn open_session<C, W>(
    camera: C,
    init: &InitParameters,
    out: &mut W,
) -> Result<CameraSession<C>, PipelineError>
where
    C: DepthCamera,
    W: Write,
{
    match CameraSession::open(camera, init) {
        Ok(session) => Ok(session),
        Err(SessionError::Open(code)) => {
            error!("Camera open failed: {}", code);
            writeln!(out, "Error {code}, exit program.")?;
            Err(PipelineError::Open(code))
        }
    }
}
