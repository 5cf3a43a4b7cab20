//! Deterministic depth camera backed by the ray-cast room.

use crate::synthetic::rig::{StereoRig, Trajectory, image_to_y_up};
use crate::synthetic::scene::{Hit, Scene};
use depthloop_core::ingest::{
    CoordinateSystem, DepthCamera, DepthMode, DeviceError, ErrorCode, GrabStatus, Grid,
    InitParameters, MappingState, MeasureKind, MeasureRequest, Measurement, PointSample, Pose,
    PositionalTrackingParameters, RuntimeParameters, SensingMode, SpatialMappingParameters, View,
};
use depthloop_core::reconstruction::VoxelMap;
use depthloop_data::Mesh;
use glam::Vec3;
use image::{Rgba, RgbaImage};
use tracing::{debug, info, warn};

/// Scene, motion and fault injection for a [`SyntheticCamera`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Distance from the starting position to the back wall, in meters.
    pub wall_distance: f32,
    /// Stereo baseline in meters.
    pub baseline: f32,
    /// Half-width of the lateral sweep in meters.
    pub sweep_amplitude: f32,
    pub sweep_period_secs: f32,
    /// Peak yaw in radians.
    pub yaw_amplitude: f32,
    /// Farthest depth the sensor reports, in meters. Fill mode uses it for
    /// pixels with no surface.
    pub max_depth: f32,
    /// Every n-th pixel in each direction is fused into the spatial map.
    pub mapping_stride: u32,
    /// Every n-th grab call reports `NotReady`.
    pub not_ready_every: Option<u32>,
    pub fail_open: Option<ErrorCode>,
    pub fail_tracking: Option<ErrorCode>,
    /// Grabs fail once this many frames have been captured.
    pub fail_grab_after: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            wall_distance: 3.0,
            baseline: 0.12,
            sweep_amplitude: 0.25,
            sweep_period_secs: 4.0,
            yaw_amplitude: 0.1,
            max_depth: 20.0,
            mapping_stride: 4,
            not_ready_every: None,
            fail_open: None,
            fail_tracking: None,
            fail_grab_after: None,
        }
    }
}

impl SyntheticConfig {
    pub fn with_wall_distance(mut self, meters: f32) -> Self {
        self.wall_distance = meters;
        self
    }

    pub fn with_not_ready_every(mut self, polls: u32) -> Self {
        self.not_ready_every = (polls > 0).then_some(polls);
        self
    }
}

/// Settings captured at open time.
#[derive(Debug, Clone, Copy)]
struct OpenState {
    init: InitParameters,
    rig: StereoRig,
    fps: f32,
}

/// The last grabbed frame. Left view hits are cast on first use.
#[derive(Debug)]
struct CapturedFrame {
    pose: Pose,
    sensing_mode: SensingMode,
    left: Option<Vec<Option<Hit>>>,
}

/// A depth camera that ray-casts a fixed room instead of reading hardware.
///
/// The camera sweeps sideways in front of the back wall. Depth, point clouds
/// and images are computed per grab, and spatial mapping fuses a subsampled
/// point cloud into a [`VoxelMap`] inside `grab`.
pub struct SyntheticCamera {
    config: SyntheticConfig,
    scene: Scene,
    device: Option<OpenState>,
    polls: u64,
    frames: u64,
    current: Option<CapturedFrame>,
    tracking: Option<Trajectory>,
    mapping: Option<VoxelMap>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticConfig) -> Self {
        let scene = Scene::room(config.wall_distance);
        Self {
            config,
            scene,
            device: None,
            polls: 0,
            frames: 0,
            current: None,
            tracking: None,
            mapping: None,
        }
    }

    /// Frames captured since the camera was opened.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Pose of the last grabbed frame.
    pub fn pose(&self) -> Option<Pose> {
        self.current.as_ref().map(|frame| frame.pose)
    }

    fn opened(&self) -> Result<OpenState, DeviceError> {
        self.device.ok_or(DeviceError::NotOpened)
    }

    fn trajectory(&self) -> Trajectory {
        self.tracking.unwrap_or(Trajectory {
            origin: Vec3::ZERO,
            amplitude: self.config.sweep_amplitude,
            period_secs: self.config.sweep_period_secs,
            yaw_amplitude: self.config.yaw_amplitude,
        })
    }

    /// Cast one ray per pixel of `view`, or per `stride`-th pixel.
    fn cast_view(&self, rig: &StereoRig, pose: &Pose, view: View, stride: u32) -> Vec<Option<Hit>> {
        let origin = pose.transform_point(rig.view_offset(view));
        let stride = stride.max(1);
        let mut hits = Vec::with_capacity(rig.pixel_count() / (stride * stride) as usize);
        for v in (0..rig.height).step_by(stride as usize) {
            for u in (0..rig.width).step_by(stride as usize) {
                let dir = pose.rotation * image_to_y_up(rig.pixel_ray(u, v));
                let hit = self
                    .scene
                    .cast(origin, dir)
                    .filter(|hit| hit.t <= self.config.max_depth);
                hits.push(hit);
            }
        }
        hits
    }

    fn left_hits(&mut self) -> Result<(&CapturedFrame, StereoRig), DeviceError> {
        let state = self.opened()?;
        let pose = self.pose().ok_or(DeviceError::NoFrame)?;
        if self.current.as_ref().is_some_and(|frame| frame.left.is_none()) {
            let hits = self.cast_view(&state.rig, &pose, View::Left, 1);
            if let Some(frame) = self.current.as_mut() {
                frame.left = Some(hits);
            }
        }
        let frame = self.current.as_ref().ok_or(DeviceError::NoFrame)?;
        Ok((frame, state.rig))
    }

    fn integrate(&mut self, state: &OpenState, pose: &Pose) {
        let Some(map) = self.mapping.as_ref() else {
            return;
        };
        let range = map.params().range_meter;
        let stride = self.config.mapping_stride.max(1);
        let hits = self.cast_view(&state.rig, pose, View::Left, stride);

        let rig = state.rig;
        let columns = rig.width.div_ceil(stride);
        let points: Vec<(Vec3, Vec3)> = hits
            .iter()
            .enumerate()
            .filter_map(|(i, hit)| {
                let hit = hit.as_ref()?;
                let u = (i as u32 % columns) * stride;
                let v = (i as u32 / columns) * stride;
                let local = image_to_y_up(rig.pixel_ray(u, v) * hit.t);
                let [r, g, b, _] = hit.rgba;
                Some((local, Vec3::new(r as f32, g as f32, b as f32) / 255.0))
            })
            .filter(|(local, _)| local.length() <= range)
            .collect();

        if let Some(map) = self.mapping.as_mut() {
            map.integrate(pose, points);
        }
    }
}

fn require_depth(init: &InitParameters, request: MeasureRequest) -> Result<(), DeviceError> {
    if init.depth_mode == DepthMode::None {
        return Err(DeviceError::Unavailable(request));
    }
    Ok(())
}

/// Convert an image-convention vector in meters to the configured output.
fn to_output(v: Vec3, init: &InitParameters) -> Vec3 {
    let v = match init.coordinate_system {
        CoordinateSystem::Image => v,
        CoordinateSystem::RightHandedYUp => image_to_y_up(v),
    };
    v * init.coordinate_units.per_meter()
}

impl DepthCamera for SyntheticCamera {
    fn open(&mut self, params: &InitParameters) -> Result<(), ErrorCode> {
        if self.device.is_some() {
            return Err(ErrorCode::CameraAlreadyOpened);
        }
        if let Some(code) = self.config.fail_open {
            warn!("Synthetic camera open failure injected: {}", code);
            return Err(code);
        }

        let rig = StereoRig::new(params.resolution, self.config.baseline);
        self.device = Some(OpenState {
            init: *params,
            rig,
            fps: params.resolution.default_fps() as f32,
        });
        self.polls = 0;
        self.frames = 0;
        self.current = None;
        info!(
            "Synthetic camera opened: {}x{} @ {} fps, wall at {} m",
            rig.width,
            rig.height,
            params.resolution.default_fps(),
            self.config.wall_distance
        );
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) {
        if self.device.take().is_none() {
            return;
        }
        self.mapping = None;
        self.tracking = None;
        self.current = None;
        info!("Synthetic camera closed after {} frames", self.frames);
    }

    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<GrabStatus, DeviceError> {
        let state = self.opened()?;
        self.polls += 1;

        if let Some(every) = self.config.not_ready_every {
            if every > 0 && self.polls % every as u64 == 0 {
                return Ok(GrabStatus::NotReady);
            }
        }
        if let Some(limit) = self.config.fail_grab_after {
            if self.frames >= limit {
                return Err(DeviceError::Code(ErrorCode::Failure));
            }
        }

        let pose = self.trajectory().pose_at(self.frames as f32 / state.fps);
        self.frames += 1;
        self.current = Some(CapturedFrame {
            pose,
            sensing_mode: runtime.sensing_mode,
            left: None,
        });
        self.integrate(&state, &pose);
        debug!("Synthetic frame {} at x = {:.3} m", self.frames, pose.position.x);
        Ok(GrabStatus::NewFrame)
    }

    fn retrieve_image(&mut self, view: View) -> Result<RgbaImage, DeviceError> {
        let background = Rgba(Scene::background());
        match view {
            View::Left => {
                let (frame, rig) = self.left_hits()?;
                let hits = frame.left.as_deref().unwrap_or_default();
                Ok(RgbaImage::from_fn(rig.width, rig.height, |x, y| {
                    hits.get((y * rig.width + x) as usize)
                        .copied()
                        .flatten()
                        .map_or(background, |hit| Rgba(hit.rgba))
                }))
            }
            View::Right => {
                let state = self.opened()?;
                let pose = self.pose().ok_or(DeviceError::NoFrame)?;
                let hits = self.cast_view(&state.rig, &pose, View::Right, 1);
                let rig = state.rig;
                Ok(RgbaImage::from_fn(rig.width, rig.height, |x, y| {
                    hits[(y * rig.width + x) as usize].map_or(background, |hit| Rgba(hit.rgba))
                }))
            }
        }
    }

    fn retrieve_measure(&mut self, kind: MeasureKind) -> Result<Measurement, DeviceError> {
        let state = self.opened()?;
        require_depth(&state.init, MeasureRequest::Measure(kind))?;
        let init = state.init;
        let max_depth = self.config.max_depth;
        let (frame, rig) = self.left_hits()?;
        let fill = frame.sensing_mode == SensingMode::Fill;
        let hits = frame.left.as_deref().unwrap_or_default();
        let hit_at = |x: u32, y: u32| hits.get((y * rig.width + x) as usize).copied().flatten();

        Ok(match kind {
            MeasureKind::Depth => {
                let scale = init.coordinate_units.per_meter();
                Measurement::Depth(Grid::from_fn(rig.width, rig.height, |x, y| {
                    match hit_at(x, y) {
                        Some(hit) => hit.t * scale,
                        None if fill => max_depth * scale,
                        None => f32::NAN,
                    }
                }))
            }
            MeasureKind::Xyzrgba => {
                Measurement::PointCloud(Grid::from_fn(rig.width, rig.height, |x, y| {
                    let ray = rig.pixel_ray(x, y);
                    match hit_at(x, y) {
                        Some(hit) => PointSample::new(to_output(ray * hit.t, &init), hit.rgba),
                        None if fill => {
                            PointSample::new(to_output(ray * max_depth, &init), Scene::background())
                        }
                        None => PointSample::invalid(),
                    }
                }))
            }
        })
    }

    fn enable_positional_tracking(
        &mut self,
        params: &PositionalTrackingParameters,
    ) -> Result<(), DeviceError> {
        self.opened()?;
        if let Some(code) = self.config.fail_tracking {
            warn!("Synthetic tracking failure injected: {}", code);
            return Err(code.into());
        }
        self.tracking = Some(Trajectory {
            origin: params.initial_position,
            ..self.trajectory()
        });
        Ok(())
    }

    fn disable_positional_tracking(&mut self) {
        if self.tracking.take().is_some() {
            debug!("Synthetic tracking disabled");
        }
    }

    fn enable_spatial_mapping(
        &mut self,
        params: &SpatialMappingParameters,
    ) -> Result<(), DeviceError> {
        let state = self.opened()?;
        if self.tracking.is_none() {
            return Err(DeviceError::NotEnabled("positional tracking"));
        }
        if state.init.depth_mode == DepthMode::None {
            return Err(ErrorCode::ModuleNotEnabled.into());
        }
        let positive = |meters: f32| meters.is_finite() && meters > 0.0;
        if !positive(params.resolution_meter) || !positive(params.range_meter) {
            return Err(ErrorCode::InvalidFunctionParameters.into());
        }
        self.mapping = Some(VoxelMap::new(*params));
        Ok(())
    }

    fn disable_spatial_mapping(&mut self) {
        if let Some(map) = self.mapping.take() {
            debug!("Synthetic mapping disabled with {} voxels", map.voxel_count());
        }
    }

    fn spatial_mapping_state(&self) -> MappingState {
        self.mapping
            .as_ref()
            .map_or(MappingState::NotEnabled, VoxelMap::state)
    }

    /// The map is kept in right-handed Y-up meters and converted on export.
    fn extract_whole_spatial_map(&mut self) -> Result<Mesh, DeviceError> {
        let state = self.opened()?;
        let map = self
            .mapping
            .as_ref()
            .ok_or(DeviceError::NotEnabled("spatial mapping"))?;
        let mut mesh = map.extract_mesh();
        for vertex in &mut mesh.vertices {
            // Back to image convention first, `to_output` applies the requested axes.
            *vertex = to_output(image_to_y_up(*vertex), &state.init);
        }
        Ok(mesh)
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthloop_core::ingest::{Resolution, Unit};

    fn vga() -> InitParameters {
        InitParameters::default().with_resolution(Resolution::Vga)
    }

    fn opened(config: SyntheticConfig, init: InitParameters) -> SyntheticCamera {
        let mut camera = SyntheticCamera::new(config);
        camera.open(&init).unwrap();
        camera
    }

    fn point_cloud(camera: &mut SyntheticCamera) -> depthloop_core::ingest::PointCloudMap {
        match camera.retrieve_measure(MeasureKind::Xyzrgba).unwrap() {
            Measurement::PointCloud(cloud) => cloud,
            other => panic!("expected point cloud, got {:?}", other.dimensions()),
        }
    }

    fn depth(camera: &mut SyntheticCamera) -> depthloop_core::ingest::DepthMap {
        match camera.retrieve_measure(MeasureKind::Depth).unwrap() {
            Measurement::Depth(depth) => depth,
            other => panic!("expected depth, got {:?}", other.dimensions()),
        }
    }

    #[test]
    fn test_open_twice_fails() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        assert_eq!(camera.open(&vga()), Err(ErrorCode::CameraAlreadyOpened));
        camera.close();
        assert!(camera.open(&vga()).is_ok());
    }

    #[test]
    fn test_injected_open_failure() {
        let config = SyntheticConfig {
            fail_open: Some(ErrorCode::CameraNotDetected),
            ..Default::default()
        };
        let mut camera = SyntheticCamera::new(config);
        assert_eq!(camera.open(&vga()), Err(ErrorCode::CameraNotDetected));
        assert!(!camera.is_opened());
    }

    #[test]
    fn test_retrieve_before_grab() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        assert!(matches!(
            camera.retrieve_measure(MeasureKind::Depth),
            Err(DeviceError::NoFrame)
        ));
        assert!(matches!(
            camera.retrieve_image(View::Right),
            Err(DeviceError::NoFrame)
        ));
    }

    #[test]
    fn test_first_frame_center_is_wall() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        camera.grab(&RuntimeParameters::default()).unwrap();

        let cloud = point_cloud(&mut camera);
        let center = cloud.get(336, 188).unwrap();
        assert_eq!(center.position, Vec3::new(0.0, 0.0, 3000.0));
        assert_eq!(center.distance(), 3000.0);

        let depth = depth(&mut camera);
        assert_eq!(depth.get(336, 188), Some(&3000.0));
    }

    #[test]
    fn test_y_up_meters_output() {
        let init = vga()
            .with_units(Unit::Meter)
            .with_coordinate_system(CoordinateSystem::RightHandedYUp);
        let mut camera = opened(SyntheticConfig::default().with_wall_distance(2.0), init);
        camera.grab(&RuntimeParameters::default()).unwrap();
        let cloud = point_cloud(&mut camera);
        assert_eq!(cloud.get(336, 188).unwrap().position, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_fill_mode_covers_open_sky() {
        let mut camera = opened(SyntheticConfig::default(), vga());

        camera.grab(&RuntimeParameters::default()).unwrap();
        assert!(depth(&mut camera).get(336, 0).unwrap().is_nan());
        assert!(!point_cloud(&mut camera).get(336, 0).unwrap().is_valid());

        let fill = RuntimeParameters {
            sensing_mode: SensingMode::Fill,
        };
        camera.grab(&fill).unwrap();
        let depth = depth(&mut camera);
        assert_eq!(depth.get(336, 0), Some(&20000.0));
        assert!(depth.iter().all(|d| d.is_finite()));
        assert!(point_cloud(&mut camera).iter().all(PointSample::is_valid));
    }

    #[test]
    fn test_views_differ_by_baseline() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        camera.grab(&RuntimeParameters::default()).unwrap();
        let left = camera.retrieve_image(View::Left).unwrap();
        let right = camera.retrieve_image(View::Right).unwrap();
        assert_eq!(left.dimensions(), (672, 376));
        assert_eq!(right.dimensions(), (672, 376));
        assert_ne!(left, right);
    }

    #[test]
    fn test_no_depth_mode_has_no_measures() {
        let mut camera = opened(
            SyntheticConfig::default(),
            vga().with_depth_mode(DepthMode::None),
        );
        camera.grab(&RuntimeParameters::default()).unwrap();
        assert!(camera.retrieve_image(View::Left).is_ok());
        assert!(matches!(
            camera.retrieve_measure(MeasureKind::Depth),
            Err(DeviceError::Unavailable(MeasureRequest::Measure(MeasureKind::Depth)))
        ));
    }

    #[test]
    fn test_not_ready_injection() {
        let mut camera = opened(SyntheticConfig::default().with_not_ready_every(3), vga());
        let runtime = RuntimeParameters::default();
        let statuses: Vec<GrabStatus> = (0..6).map(|_| camera.grab(&runtime).unwrap()).collect();
        assert_eq!(
            statuses,
            vec![
                GrabStatus::NewFrame,
                GrabStatus::NewFrame,
                GrabStatus::NotReady,
                GrabStatus::NewFrame,
                GrabStatus::NewFrame,
                GrabStatus::NotReady,
            ]
        );
        assert_eq!(camera.frame_count(), 4);
    }

    #[test]
    fn test_grab_failure_injection() {
        let config = SyntheticConfig {
            fail_grab_after: Some(2),
            ..Default::default()
        };
        let mut camera = opened(config, vga());
        let runtime = RuntimeParameters::default();
        assert!(camera.grab(&runtime).is_ok());
        assert!(camera.grab(&runtime).is_ok());
        assert!(matches!(
            camera.grab(&runtime),
            Err(DeviceError::Code(ErrorCode::Failure))
        ));
    }

    #[test]
    fn test_grab_requires_open() {
        let mut camera = SyntheticCamera::new(SyntheticConfig::default());
        assert!(matches!(
            camera.grab(&RuntimeParameters::default()),
            Err(DeviceError::NotOpened)
        ));
    }

    #[test]
    fn test_mapping_requires_tracking() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        assert!(matches!(
            camera.enable_spatial_mapping(&SpatialMappingParameters::default()),
            Err(DeviceError::NotEnabled("positional tracking"))
        ));
        assert_eq!(camera.spatial_mapping_state(), MappingState::NotEnabled);
    }

    #[test]
    fn test_mapping_state_and_extraction() {
        let init = vga()
            .with_units(Unit::Meter)
            .with_coordinate_system(CoordinateSystem::RightHandedYUp);
        let mut camera = opened(SyntheticConfig::default(), init);
        camera
            .enable_positional_tracking(&PositionalTrackingParameters::default())
            .unwrap();
        camera
            .enable_spatial_mapping(&SpatialMappingParameters::default())
            .unwrap();
        assert_eq!(camera.spatial_mapping_state(), MappingState::Initializing);

        let runtime = RuntimeParameters::default();
        for _ in 0..3 {
            camera.grab(&runtime).unwrap();
        }
        assert_eq!(camera.spatial_mapping_state(), MappingState::Ok);

        let mesh = camera.extract_whole_spatial_map().unwrap();
        assert!(mesh.triangle_count() > 0);
        assert!(mesh.has_colors());
        let (min, max) = mesh.bounds().unwrap();
        assert!(max.z < 0.0);
        assert!(min.z > -3.5);
        assert!(min.y < -1.0);
    }

    #[test]
    fn test_extraction_follows_units_and_axes() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        camera
            .enable_positional_tracking(&PositionalTrackingParameters::default())
            .unwrap();
        camera
            .enable_spatial_mapping(&SpatialMappingParameters::default())
            .unwrap();
        camera.grab(&RuntimeParameters::default()).unwrap();

        // Image convention in millimeters: everything is in front (z > 0).
        let (min, max) = camera.extract_whole_spatial_map().unwrap().bounds().unwrap();
        assert!(min.z > 1000.0);
        assert!(max.z < 3500.0);
        assert!(max.y > 1000.0);
    }

    #[test]
    fn test_mapping_rejects_bad_sizes() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        camera
            .enable_positional_tracking(&PositionalTrackingParameters::default())
            .unwrap();
        for (resolution, range) in [
            (f32::NAN, 3.5),
            (0.05, f32::NAN),
            (0.0, 3.5),
            (-0.05, 3.5),
            (f32::INFINITY, 3.5),
        ] {
            let params = SpatialMappingParameters {
                resolution_meter: resolution,
                range_meter: range,
                max_memory_usage_mb: 2048,
            };
            assert!(matches!(
                camera.enable_spatial_mapping(&params),
                Err(DeviceError::Code(ErrorCode::InvalidFunctionParameters))
            ));
        }
        assert_eq!(camera.spatial_mapping_state(), MappingState::NotEnabled);
    }

    #[test]
    fn test_extract_without_mapping() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        assert!(matches!(
            camera.extract_whole_spatial_map(),
            Err(DeviceError::NotEnabled("spatial mapping"))
        ));
    }

    #[test]
    fn test_close_disables_modules() {
        let mut camera = opened(SyntheticConfig::default(), vga());
        camera
            .enable_positional_tracking(&PositionalTrackingParameters::default())
            .unwrap();
        camera
            .enable_spatial_mapping(&SpatialMappingParameters::default())
            .unwrap();
        camera.close();
        assert!(!camera.is_opened());
        assert_eq!(camera.spatial_mapping_state(), MappingState::NotEnabled);
        camera.close();
    }
}
