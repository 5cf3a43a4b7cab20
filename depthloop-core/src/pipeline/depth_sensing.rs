//! Depth sensing: print the distance to whatever is at the image center.

use crate::acquisition::{AcquisitionLoop, Frame, HandlerError, WaitPolicy};
use crate::ingest::{
    DepthCamera, DepthMode, InitParameters, MeasureKind, MeasureRequest, PointCloudMap,
    RuntimeParameters, Unit, View,
};
use crate::pipeline::{PipelineError, open_session};
use std::io::Write;
use tracing::info;

/// Left image, depth map and point cloud, in that order.
pub const DEPTH_SENSING_REQUESTS: [MeasureRequest; 3] = [
    MeasureRequest::Image(View::Left),
    MeasureRequest::Measure(MeasureKind::Depth),
    MeasureRequest::Measure(MeasureKind::Xyzrgba),
];

#[derive(Debug, Clone)]
pub struct DepthSensingConfig {
    pub frames: u64,
    pub init: InitParameters,
    pub runtime: RuntimeParameters,
    pub wait: WaitPolicy,
}

impl Default for DepthSensingConfig {
    fn default() -> Self {
        Self {
            frames: 50,
            init: InitParameters::default()
                .with_depth_mode(DepthMode::Performance)
                .with_units(Unit::Millimeter),
            runtime: RuntimeParameters::default(),
            wait: WaitPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthSensingReport {
    pub frames: u64,
    pub idle_polls: u64,
    /// Center distance of each frame, in the configured unit.
    pub distances: Vec<f32>,
}

/// Distance from the camera to the point-cloud sample at the image center.
///
/// The center is `(width / 2, height / 2)` of the image, using integer
/// division. Returns the pixel and the Euclidean norm of its XYZ. Returns
/// `None` if the cloud has no sample there.
pub fn center_distance(image_size: (u32, u32), cloud: &PointCloudMap) -> Option<((u32, u32), f32)> {
    let (x, y) = (image_size.0 / 2, image_size.1 / 2);
    cloud.get(x, y).map(|sample| ((x, y), sample.distance()))
}

/// Grab `config.frames` frames and print one distance line per frame to `out`.
#[tracing::instrument(skip_all, fields(frames = config.frames))]
pub fn run_depth_sensing<C, W>(
    camera: C,
    config: &DepthSensingConfig,
    out: &mut W,
) -> Result<DepthSensingReport, PipelineError>
where
    C: DepthCamera,
    W: Write,
{
    let mut session = open_session(camera, &config.init, out)?;
    let unit = config.init.coordinate_units.symbol();
    let mut distances = Vec::new();

    let mut handler = |frame: &Frame| -> Result<(), HandlerError> {
        let image = frame.image(View::Left).ok_or("left image was not retrieved")?;
        let cloud = frame.point_cloud().ok_or("point cloud was not retrieved")?;
        let ((x, y), distance) = center_distance(image.dimensions(), cloud).ok_or_else(|| {
            format!(
                "point cloud {}x{} does not cover the center of a {}x{} image",
                cloud.width(),
                cloud.height(),
                image.width(),
                image.height()
            )
        })?;
        writeln!(out, "Distance to Camera at ({x}, {y}): {distance:.6} {unit}")?;
        distances.push(distance);
        Ok(())
    };

    let summary = AcquisitionLoop::new(config.frames)
        .with_requests(DEPTH_SENSING_REQUESTS)
        .with_wait(config.wait)
        .run(session.camera_mut(), &config.runtime, &mut handler)?;

    session.close();
    info!("Depth sensing done after {} frames", summary.frames);

    Ok(DepthSensingReport {
        frames: summary.frames,
        idle_polls: summary.idle_polls,
        distances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::scripted::{Call, ScriptedCamera};
    use crate::ingest::{ErrorCode, GrabStatus, Grid, PointSample};
    use glam::Vec3;

    fn run(camera: &mut ScriptedCamera, config: &DepthSensingConfig) -> (Result<DepthSensingReport, PipelineError>, String) {
        let mut out = Vec::new();
        let result = run_depth_sensing(camera, config, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_center_distance_known_point() {
        let cloud = Grid::from_fn(5, 3, |x, y| {
            if (x, y) == (2, 1) {
                PointSample::new(Vec3::new(3.0, 4.0, 0.0), [0; 4])
            } else {
                PointSample::invalid()
            }
        });
        assert_eq!(center_distance((5, 3), &cloud), Some(((2, 1), 5.0)));
    }

    #[test]
    fn test_center_distance_outside_cloud() {
        let cloud = Grid::from_fn(2, 2, |_, _| PointSample::invalid());
        assert_eq!(center_distance((10, 10), &cloud), None);
    }

    #[test]
    fn test_fifty_distance_lines() {
        let mut camera = ScriptedCamera::new();
        let (result, output) = run(&mut camera, &DepthSensingConfig::default());
        let report = result.unwrap();

        assert_eq!(report.frames, 50);
        assert_eq!(report.distances, vec![5.0; 50]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|l| *l == "Distance to Camera at (2, 2): 5.000000 mm"));
        for request in DEPTH_SENSING_REQUESTS {
            assert_eq!(camera.count(Call::Retrieve(request)), 50);
        }
        assert_eq!(camera.calls.last(), Some(&Call::Close));
    }

    #[test]
    fn test_not_ready_polls_are_not_printed() {
        let mut camera = ScriptedCamera::new().with_script([
            Ok(GrabStatus::NotReady),
            Ok(GrabStatus::NewFrame),
            Ok(GrabStatus::NotReady),
            Ok(GrabStatus::NotReady),
        ]);
        let config = DepthSensingConfig {
            frames: 3,
            wait: WaitPolicy::Spin,
            ..Default::default()
        };
        let (result, output) = run(&mut camera, &config);
        let report = result.unwrap();
        assert_eq!(report.idle_polls, 3);
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_open_failure_never_polls() {
        let mut camera = ScriptedCamera::new();
        camera.fail_open = Some(ErrorCode::CameraNotDetected);
        let (result, output) = run(&mut camera, &DepthSensingConfig::default());

        assert!(matches!(result, Err(PipelineError::Open(ErrorCode::CameraNotDetected))));
        assert_eq!(output, "Error CAMERA_NOT_DETECTED, exit program.\n");
        assert_eq!(camera.count(Call::Grab), 0);
        assert_eq!(camera.count(Call::Close), 0);
    }

    #[test]
    fn test_grab_error_still_closes_camera() {
        let mut camera = ScriptedCamera::new().with_script([
            Ok(GrabStatus::NewFrame),
            Err(ErrorCode::Failure),
        ]);
        let (result, output) = run(&mut camera, &DepthSensingConfig::default());
        assert!(matches!(result, Err(PipelineError::Acquisition(_))));
        assert_eq!(output.lines().count(), 1);
        assert_eq!(camera.calls.last(), Some(&Call::Close));
        assert!(!camera.is_opened());
    }
}
