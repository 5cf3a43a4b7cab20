//! Scoped ownership of an opened camera.

use crate::ingest::{
    DepthCamera, DeviceError, ErrorCode, InitParameters, PositionalTrackingParameters,
    SpatialMappingParameters,
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to open camera: {0}")]
    Open(ErrorCode),
}

/// An opened camera plus the modules enabled on it.
///
/// Dropping the session (or calling [`CameraSession::close`]) disables
/// spatial mapping, then positional tracking, then closes the device. Only
/// what was actually enabled is disabled.
pub struct CameraSession<C: DepthCamera> {
    camera: C,
    tracking: bool,
    mapping: bool,
    released: bool,
}

impl<C: DepthCamera> CameraSession<C> {
    /// Open `camera`. If opening fails nothing is held and nothing is released.
    pub fn open(mut camera: C, params: &InitParameters) -> Result<Self, SessionError> {
        camera.open(params).map_err(SessionError::Open)?;
        info!(
            "Camera opened ({}, depth {}, units {})",
            params.resolution, params.depth_mode, params.coordinate_units
        );
        Ok(Self {
            camera,
            tracking: false,
            mapping: false,
            released: false,
        })
    }

    pub fn enable_positional_tracking(
        &mut self,
        params: &PositionalTrackingParameters,
    ) -> Result<(), DeviceError> {
        self.camera.enable_positional_tracking(params)?;
        self.tracking = true;
        debug!("Positional tracking enabled");
        Ok(())
    }

    pub fn enable_spatial_mapping(
        &mut self,
        params: &SpatialMappingParameters,
    ) -> Result<(), DeviceError> {
        self.camera.enable_spatial_mapping(params)?;
        self.mapping = true;
        debug!(
            "Spatial mapping enabled (resolution {} m, range {} m)",
            params.resolution_meter, params.range_meter
        );
        Ok(())
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// Tear down explicitly. Equivalent to dropping the session.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.mapping {
            self.camera.disable_spatial_mapping();
            self.mapping = false;
        }
        if self.tracking {
            self.camera.disable_positional_tracking();
            self.tracking = false;
        }
        self.camera.close();
        info!("Camera closed");
    }
}

impl<C: DepthCamera> Drop for CameraSession<C> {
    fn drop(&mut self) {
        self.release();
    }
}
