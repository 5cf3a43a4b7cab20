//! Spatial mapping: build a mesh of the scene while the camera moves, then
//! filter it and save it.

use crate::acquisition::{AcquisitionLoop, Frame, HandlerError, WaitPolicy};
use crate::ingest::{
    CoordinateSystem, DepthCamera, InitParameters, MappingState, PositionalTrackingParameters,
    Resolution, RuntimeParameters, SpatialMappingParameters, Unit,
};
use crate::pipeline::{PipelineError, open_session};
use depthloop_data::{FilterStats, MeshFilter};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SpatialMappingConfig {
    pub frames: u64,
    pub init: InitParameters,
    pub runtime: RuntimeParameters,
    pub tracking: PositionalTrackingParameters,
    pub mapping: SpatialMappingParameters,
    pub filter: MeshFilter,
    pub output: PathBuf,
    pub wait: WaitPolicy,
}

impl Default for SpatialMappingConfig {
    fn default() -> Self {
        Self {
            frames: 500,
            init: InitParameters::default()
                .with_resolution(Resolution::Hd720)
                .with_coordinate_system(CoordinateSystem::RightHandedYUp)
                .with_units(Unit::Meter),
            runtime: RuntimeParameters::default(),
            tracking: PositionalTrackingParameters::default(),
            mapping: SpatialMappingParameters::default(),
            filter: MeshFilter::Low,
            output: PathBuf::from("mesh.obj"),
            wait: WaitPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMappingReport {
    pub frames: u64,
    pub idle_polls: u64,
    pub mesh: FilterStats,
    pub output: PathBuf,
}

/// Track and map for `config.frames` frames, then extract, filter and save
/// the mesh to `config.output`.
///
/// If tracking or mapping cannot be enabled, no frame is grabbed and no file
/// is written.
#[tracing::instrument(skip_all, fields(frames = config.frames, output = %config.output.display()))]
pub fn run_spatial_mapping<C, W>(
    camera: C,
    config: &SpatialMappingConfig,
    out: &mut W,
) -> Result<SpatialMappingReport, PipelineError>
where
    C: DepthCamera,
    W: Write,
{
    let mut session = open_session(camera, &config.init, out)?;
    session
        .enable_positional_tracking(&config.tracking)
        .map_err(PipelineError::Tracking)?;
    session
        .enable_spatial_mapping(&config.mapping)
        .map_err(PipelineError::Mapping)?;

    let total = config.frames;
    let mut handler = |frame: &Frame| -> Result<(), HandlerError> {
        let state = frame.mapping_state.unwrap_or(MappingState::NotEnabled);
        write!(
            out,
            "\rImages captured: {} / {}  ||  Spatial mapping state: {}{:21}",
            frame.index, total, state, ""
        )?;
        out.flush()?;
        Ok(())
    };

    let summary = AcquisitionLoop::new(config.frames)
        .with_mapping_state()
        .with_wait(config.wait)
        .run(session.camera_mut(), &config.runtime, &mut handler)?;
    writeln!(out)?;

    let mesh = export_mesh(session.camera_mut(), config.filter, &config.output, out)?;
    session.close();

    Ok(SpatialMappingReport {
        frames: summary.frames,
        idle_polls: summary.idle_polls,
        mesh,
        output: config.output.clone(),
    })
}

/// Extract the whole map, filter it and save it.
fn export_mesh<C, W>(
    camera: &mut C,
    filter: MeshFilter,
    path: &Path,
    out: &mut W,
) -> Result<FilterStats, PipelineError>
where
    C: DepthCamera,
    W: Write,
{
    writeln!(out, "Extracting Mesh...")?;
    let mut mesh = camera
        .extract_whole_spatial_map()
        .map_err(PipelineError::Extract)?;

    writeln!(out, "Filtering Mesh...")?;
    let stats = mesh.filter(filter);

    writeln!(out, "Saving Mesh...")?;
    mesh.save(path)?;
    info!(
        "Saved {} vertices, {} triangles to {}",
        stats.vertices_after,
        stats.triangles_after,
        path.display()
    );
    Ok(stats)
}
