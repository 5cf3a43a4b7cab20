//! The depth camera interface.

use crate::ingest::mapping::{MappingState, PositionalTrackingParameters, SpatialMappingParameters};
use crate::ingest::measure::{MeasureKind, MeasureRequest, Measurement, View};
use crate::ingest::params::{InitParameters, RuntimeParameters};
use depthloop_data::Mesh;
use image::RgbaImage;
use std::fmt;

/// Status code reported by a camera driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    CameraNotDetected,
    CameraAlreadyOpened,
    InvalidResolution,
    MotionSensorsRequired,
    ModuleNotEnabled,
    InvalidFunctionParameters,
    LowMemory,
    Failure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCode::CameraNotDetected => "CAMERA_NOT_DETECTED",
            ErrorCode::CameraAlreadyOpened => "CAMERA_ALREADY_OPENED",
            ErrorCode::InvalidResolution => "INVALID_RESOLUTION",
            ErrorCode::MotionSensorsRequired => "MOTION_SENSORS_REQUIRED",
            ErrorCode::ModuleNotEnabled => "MODULE_NOT_ENABLED",
            ErrorCode::InvalidFunctionParameters => "INVALID_FUNCTION_PARAMETERS",
            ErrorCode::LowMemory => "LOW_MEMORY",
            ErrorCode::Failure => "FAILURE",
        })
    }
}

/// Errors returned by an opened camera.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("camera error: {0}")]
    Code(ErrorCode),
    #[error("camera is not opened")]
    NotOpened,
    #[error("no frame has been grabbed yet")]
    NoFrame,
    #[error("{0} is not available with the current configuration")]
    Unavailable(MeasureRequest),
    #[error("{0} is not enabled")]
    NotEnabled(&'static str),
}

impl From<ErrorCode> for DeviceError {
    fn from(code: ErrorCode) -> Self {
        DeviceError::Code(code)
    }
}

/// Outcome of a successful call to [`DepthCamera::grab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    /// A new frame was captured and its measurements can be retrieved.
    NewFrame,
    /// No new frame yet. Poll again.
    NotReady,
}

/// A stereo depth camera with optional tracking and spatial mapping.
///
/// Implementations own the device. Every method that touches frame data
/// refers to the most recent `GrabStatus::NewFrame`.
pub trait DepthCamera {
    /// Open the device. Any previous session must have been closed.
    fn open(&mut self, params: &InitParameters) -> Result<(), ErrorCode>;

    fn is_opened(&self) -> bool;

    /// Close the device. Closing a closed camera does nothing.
    fn close(&mut self);

    /// Poll for a new frame.
    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<GrabStatus, DeviceError>;

    /// Retrieve a sensor image of the last grabbed frame.
    fn retrieve_image(&mut self, view: View) -> Result<RgbaImage, DeviceError>;

    /// Retrieve a metric measure of the last grabbed frame.
    fn retrieve_measure(&mut self, kind: MeasureKind) -> Result<Measurement, DeviceError>;

    fn enable_positional_tracking(
        &mut self,
        params: &PositionalTrackingParameters,
    ) -> Result<(), DeviceError>;

    fn disable_positional_tracking(&mut self);

    /// Start fusing grabbed frames into a map. Requires positional tracking.
    fn enable_spatial_mapping(&mut self, params: &SpatialMappingParameters)
    -> Result<(), DeviceError>;

    fn disable_spatial_mapping(&mut self);

    fn spatial_mapping_state(&self) -> MappingState;

    /// Extract the whole map built so far as a mesh.
    fn extract_whole_spatial_map(&mut self) -> Result<Mesh, DeviceError>;

    /// Fetch one requested item.
    fn retrieve(&mut self, request: MeasureRequest) -> Result<Measurement, DeviceError> {
        match request {
            MeasureRequest::Image(view) => self.retrieve_image(view).map(Measurement::Image),
            MeasureRequest::Measure(kind) => self.retrieve_measure(kind),
        }
    }
}

impl<C: DepthCamera + ?Sized> DepthCamera for &mut C {
    fn open(&mut self, params: &InitParameters) -> Result<(), ErrorCode> {
        (**self).open(params)
    }

    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<GrabStatus, DeviceError> {
        (**self).grab(runtime)
    }

    fn retrieve_image(&mut self, view: View) -> Result<RgbaImage, DeviceError> {
        (**self).retrieve_image(view)
    }

    fn retrieve_measure(&mut self, kind: MeasureKind) -> Result<Measurement, DeviceError> {
        (**self).retrieve_measure(kind)
    }

    fn enable_positional_tracking(
        &mut self,
        params: &PositionalTrackingParameters,
    ) -> Result<(), DeviceError> {
        (**self).enable_positional_tracking(params)
    }

    fn disable_positional_tracking(&mut self) {
        (**self).disable_positional_tracking()
    }

    fn enable_spatial_mapping(
        &mut self,
        params: &SpatialMappingParameters,
    ) -> Result<(), DeviceError> {
        (**self).enable_spatial_mapping(params)
    }

    fn disable_spatial_mapping(&mut self) {
        (**self).disable_spatial_mapping()
    }

    fn spatial_mapping_state(&self) -> MappingState {
        (**self).spatial_mapping_state()
    }

    fn extract_whole_spatial_map(&mut self) -> Result<Mesh, DeviceError> {
        (**self).extract_whole_spatial_map()
    }

    fn retrieve(&mut self, request: MeasureRequest) -> Result<Measurement, DeviceError> {
        (**self).retrieve(request)
    }
}
