//! The bounded acquisition loop.

use crate::acquisition::WaitPolicy;
use crate::ingest::{
    DepthCamera, DepthMap, DeviceError, GrabStatus, MappingState, MeasureKind, MeasureRequest,
    Measurement, PointCloudMap, RuntimeParameters, View,
};
use image::RgbaImage;
use tracing::{debug, info, warn};

/// Error type handlers return to stop the loop.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the acquisition loop.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("grab failed after {frame} frames: {source}")]
    Device {
        frame: u64,
        #[source]
        source: DeviceError,
    },
    #[error("could not retrieve {request} for frame {frame}: {source}")]
    Retrieve {
        frame: u64,
        request: MeasureRequest,
        #[source]
        source: DeviceError,
    },
    #[error("frame {frame} handler failed: {source}")]
    Handler {
        frame: u64,
        #[source]
        source: HandlerError,
    },
}

/// Data handed to the handler for each new frame.
#[derive(Debug)]
pub struct Frame {
    /// Zero-based count of new frames before this one.
    pub index: u64,
    /// Requested measurements, in request order.
    pub measurements: Vec<(MeasureRequest, Measurement)>,
    /// Mapping state read right after the grab, if requested.
    pub mapping_state: Option<MappingState>,
}

impl Frame {
    pub fn get(&self, request: MeasureRequest) -> Option<&Measurement> {
        self.measurements
            .iter()
            .find(|(r, _)| *r == request)
            .map(|(_, m)| m)
    }

    pub fn image(&self, view: View) -> Option<&RgbaImage> {
        match self.get(MeasureRequest::Image(view))? {
            Measurement::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn depth(&self) -> Option<&DepthMap> {
        match self.get(MeasureRequest::Measure(MeasureKind::Depth))? {
            Measurement::Depth(depth) => Some(depth),
            _ => None,
        }
    }

    pub fn point_cloud(&self) -> Option<&PointCloudMap> {
        match self.get(MeasureRequest::Measure(MeasureKind::Xyzrgba))? {
            Measurement::PointCloud(cloud) => Some(cloud),
            _ => None,
        }
    }
}

/// Consumer of acquired frames.
pub trait FrameHandler {
    fn on_frame(&mut self, frame: &Frame) -> Result<(), HandlerError>;
}

impl<F> FrameHandler for F
where
    F: FnMut(&Frame) -> Result<(), HandlerError>,
{
    fn on_frame(&mut self, frame: &Frame) -> Result<(), HandlerError> {
        self(frame)
    }
}

/// Counters from a finished loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// New frames handled. Always equals the loop's `max_frames`.
    pub frames: u64,
    /// Polls that returned `NotReady`.
    pub idle_polls: u64,
}

/// Polls a camera until a fixed number of new frames has been handled.
///
/// Only `NewFrame` advances the frame counter. A `NotReady` poll retrieves
/// nothing and runs the wait policy. A grab error ends the loop.
#[derive(Debug, Clone)]
pub struct AcquisitionLoop {
    max_frames: u64,
    requests: Vec<MeasureRequest>,
    query_mapping_state: bool,
    wait: WaitPolicy,
}

impl AcquisitionLoop {
    pub fn new(max_frames: u64) -> Self {
        Self {
            max_frames,
            requests: Vec::new(),
            query_mapping_state: false,
            wait: WaitPolicy::default(),
        }
    }

    /// Items to retrieve after every new frame.
    pub fn with_requests(mut self, requests: impl IntoIterator<Item = MeasureRequest>) -> Self {
        self.requests = requests.into_iter().collect();
        self
    }

    /// Read the spatial mapping state after every new frame.
    pub fn with_mapping_state(mut self) -> Self {
        self.query_mapping_state = true;
        self
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn run<C, H>(
        &self,
        camera: &mut C,
        runtime: &RuntimeParameters,
        handler: &mut H,
    ) -> Result<LoopSummary, AcquisitionError>
    where
        C: DepthCamera + ?Sized,
        H: FrameHandler + ?Sized,
    {
        info!(
            "Acquiring {} frames ({} requests per frame, wait: {:?})",
            self.max_frames,
            self.requests.len(),
            self.wait
        );

        let mut frames = 0;
        let mut idle_polls = 0;

        while frames < self.max_frames {
            match camera.grab(runtime) {
                Ok(GrabStatus::NewFrame) => {}
                Ok(GrabStatus::NotReady) => {
                    idle_polls += 1;
                    self.wait.idle();
                    continue;
                }
                Err(source) => {
                    warn!("Grab failed after {} frames: {}", frames, source);
                    return Err(AcquisitionError::Device {
                        frame: frames,
                        source,
                    });
                }
            }

            let mut measurements = Vec::with_capacity(self.requests.len());
            for &request in &self.requests {
                let measurement = camera
                    .retrieve(request)
                    .map_err(|source| AcquisitionError::Retrieve {
                        frame: frames,
                        request,
                        source,
                    })?;
                measurements.push((request, measurement));
            }

            let mapping_state = self
                .query_mapping_state
                .then(|| camera.spatial_mapping_state());

            let frame = Frame {
                index: frames,
                measurements,
                mapping_state,
            };
            handler
                .on_frame(&frame)
                .map_err(|source| AcquisitionError::Handler {
                    frame: frames,
                    source,
                })?;

            frames += 1;
            debug!("Frame {}/{} done", frames, self.max_frames);
        }

        info!(
            "Acquisition finished: {} frames, {} idle polls",
            frames, idle_polls
        );
        Ok(LoopSummary { frames, idle_polls })
    }
}
