//! Scripted camera double for unit tests.

use super::*;
use depthloop_data::Mesh;
use glam::Vec3;
use image::{Rgba, RgbaImage};
use std::cell::Cell;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Open,
    Grab,
    Retrieve(MeasureRequest),
    EnableTracking,
    DisableTracking,
    EnableMapping,
    DisableMapping,
    Extract,
    Close,
}

/// Camera whose grab results follow a script; once the script runs out every
/// grab yields a new frame.
pub struct ScriptedCamera {
    pub script: VecDeque<Result<GrabStatus, ErrorCode>>,
    pub calls: Vec<Call>,
    pub fail_open: Option<ErrorCode>,
    pub fail_tracking: Option<ErrorCode>,
    pub fail_mapping: Option<ErrorCode>,
    pub size: (u32, u32),
    pub center_point: Vec3,
    pub state_queries: Cell<usize>,
    opened: bool,
    grabbed: bool,
    tracking: bool,
    mapping: bool,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            calls: Vec::new(),
            fail_open: None,
            fail_tracking: None,
            fail_mapping: None,
            size: (4, 4),
            center_point: Vec3::new(3.0, 4.0, 0.0),
            state_queries: Cell::new(0),
            opened: false,
            grabbed: false,
            tracking: false,
            mapping: false,
        }
    }

    pub fn with_script(mut self, script: impl IntoIterator<Item = Result<GrabStatus, ErrorCode>>) -> Self {
        self.script = script.into_iter().collect();
        self
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn position(&self, call: Call) -> Option<usize> {
        self.calls.iter().position(|c| *c == call)
    }

    fn check_frame(&self) -> Result<(), DeviceError> {
        if !self.opened {
            return Err(DeviceError::NotOpened);
        }
        if !self.grabbed {
            return Err(DeviceError::NoFrame);
        }
        Ok(())
    }
}

impl DepthCamera for ScriptedCamera {
    fn open(&mut self, _params: &InitParameters) -> Result<(), ErrorCode> {
        self.calls.push(Call::Open);
        if let Some(code) = self.fail_open {
            return Err(code);
        }
        self.opened = true;
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
        self.opened = false;
    }

    fn grab(&mut self, _runtime: &RuntimeParameters) -> Result<GrabStatus, DeviceError> {
        self.calls.push(Call::Grab);
        if !self.opened {
            return Err(DeviceError::NotOpened);
        }
        let status = self.script.pop_front().unwrap_or(Ok(GrabStatus::NewFrame))?;
        if status == GrabStatus::NewFrame {
            self.grabbed = true;
        }
        Ok(status)
    }

    fn retrieve_image(&mut self, view: View) -> Result<RgbaImage, DeviceError> {
        self.calls.push(Call::Retrieve(MeasureRequest::Image(view)));
        self.check_frame()?;
        Ok(RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([128, 128, 128, 255])))
    }

    fn retrieve_measure(&mut self, kind: MeasureKind) -> Result<Measurement, DeviceError> {
        self.calls.push(Call::Retrieve(MeasureRequest::Measure(kind)));
        self.check_frame()?;
        let (w, h) = self.size;
        let (cx, cy) = (w / 2, h / 2);
        let center = self.center_point;
        Ok(match kind {
            MeasureKind::Depth => Measurement::Depth(Grid::from_fn(w, h, |x, y| {
                if (x, y) == (cx, cy) { center.z } else { 1.0 }
            })),
            MeasureKind::Xyzrgba => Measurement::PointCloud(Grid::from_fn(w, h, |x, y| {
                if (x, y) == (cx, cy) {
                    PointSample::new(center, [255; 4])
                } else {
                    PointSample::new(Vec3::new(0.0, 0.0, 1.0), [0, 0, 0, 255])
                }
            })),
        })
    }

    fn enable_positional_tracking(
        &mut self,
        _params: &PositionalTrackingParameters,
    ) -> Result<(), DeviceError> {
        self.calls.push(Call::EnableTracking);
        if let Some(code) = self.fail_tracking {
            return Err(code.into());
        }
        self.tracking = true;
        Ok(())
    }

    fn disable_positional_tracking(&mut self) {
        self.calls.push(Call::DisableTracking);
        self.tracking = false;
    }

    fn enable_spatial_mapping(
        &mut self,
        _params: &SpatialMappingParameters,
    ) -> Result<(), DeviceError> {
        self.calls.push(Call::EnableMapping);
        if !self.tracking {
            return Err(DeviceError::NotEnabled("positional tracking"));
        }
        if let Some(code) = self.fail_mapping {
            return Err(code.into());
        }
        self.mapping = true;
        Ok(())
    }

    fn disable_spatial_mapping(&mut self) {
        self.calls.push(Call::DisableMapping);
        self.mapping = false;
    }

    fn spatial_mapping_state(&self) -> MappingState {
        self.state_queries.set(self.state_queries.get() + 1);
        if self.mapping {
            MappingState::Ok
        } else {
            MappingState::NotEnabled
        }
    }

    fn extract_whole_spatial_map(&mut self) -> Result<Mesh, DeviceError> {
        self.calls.push(Call::Extract);
        if !self.mapping {
            return Err(DeviceError::NotEnabled("spatial mapping"));
        }
        // A quad split into two triangles with the shared edge duplicated.
        Ok(Mesh::from_parts(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::ZERO,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::Y,
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        ))
    }
}
