//! Command line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use depthloop_capture::SyntheticConfig;
use depthloop_core::acquisition::WaitPolicy;
use depthloop_core::ingest::{
    DepthMode, InitParameters, Resolution, RuntimeParameters, SensingMode,
    SpatialMappingParameters, Unit,
};
use depthloop_core::pipeline::{DepthSensingConfig, SpatialMappingConfig};
use depthloop_data::MeshFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Depthloop - Depth sensing and spatial mapping on a stereo depth camera
#[derive(Parser, Debug)]
#[command(name = "depthloop")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub wait: WaitArgs,

    #[command(flatten)]
    pub scene: SceneArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the distance to the point at the image center, once per frame
    DepthSensing(DepthSensingArgs),
    /// Map the scene while tracking the camera, then save a filtered mesh
    SpatialMapping(SpatialMappingArgs),
}

#[derive(clap::Args, Debug)]
pub struct DepthSensingArgs {
    /// Number of frames to process
    #[arg(long, default_value_t = 50)]
    pub frames: u64,

    /// Sensor resolution (hd2k, hd1080, hd720, vga)
    #[arg(long, default_value_t = Resolution::Hd720)]
    pub resolution: Resolution,

    /// Depth mode (none, performance, quality, ultra)
    #[arg(long, default_value_t = DepthMode::Performance)]
    pub depth_mode: DepthMode,

    /// Unit of the printed distance (millimeter, centimeter, meter)
    #[arg(long, default_value_t = Unit::Millimeter)]
    pub unit: Unit,

    /// Sensing mode (standard, fill)
    #[arg(long, default_value_t = SensingMode::Standard)]
    pub sensing_mode: SensingMode,
}

#[derive(clap::Args, Debug)]
pub struct SpatialMappingArgs {
    /// Number of frames to map
    #[arg(long, default_value_t = 500)]
    pub frames: u64,

    /// Sensor resolution (hd2k, hd1080, hd720, vga)
    #[arg(long, default_value_t = Resolution::Hd720)]
    pub resolution: Resolution,

    /// Mesh output path (.obj)
    #[arg(short, long, default_value = "mesh.obj")]
    pub output: PathBuf,

    /// Mesh filter level (low, medium, high)
    #[arg(long, default_value_t = MeshFilter::Low)]
    pub filter: MeshFilter,

    /// Voxel size in meters
    #[arg(long, default_value_t = 0.05)]
    pub mapping_resolution: f32,

    /// Maximum integration distance in meters
    #[arg(long, default_value_t = 3.5)]
    pub mapping_range: f32,

    /// Memory budget of the spatial map
    #[arg(long, default_value_t = 2048)]
    pub max_memory_mb: u32,
}

/// How the loop waits after a `NotReady` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WaitKind {
    Spin,
    Yield,
    Sleep,
}

#[derive(clap::Args, Debug)]
pub struct WaitArgs {
    /// Wait strategy between polls that return no frame
    #[arg(long, global = true, value_enum, default_value = "yield")]
    pub wait: WaitKind,

    /// Sleep duration for `--wait sleep`
    #[arg(long, global = true, default_value_t = 1)]
    pub sleep_ms: u64,
}

impl WaitArgs {
    pub fn policy(&self) -> WaitPolicy {
        match self.wait {
            WaitKind::Spin => WaitPolicy::Spin,
            WaitKind::Yield => WaitPolicy::Yield,
            WaitKind::Sleep => WaitPolicy::Sleep(Duration::from_millis(self.sleep_ms)),
        }
    }
}

/// Knobs of the synthetic camera.
#[derive(clap::Args, Debug)]
pub struct SceneArgs {
    /// Distance to the back wall in meters
    #[arg(long, global = true, default_value_t = 3.0)]
    pub wall_distance: f32,

    /// Report `NotReady` on every n-th poll
    #[arg(long, global = true)]
    pub not_ready_every: Option<u32>,
}

impl SceneArgs {
    pub fn synthetic_config(&self) -> SyntheticConfig {
        let config = SyntheticConfig::default().with_wall_distance(self.wall_distance);
        match self.not_ready_every {
            Some(every) => config.with_not_ready_every(every),
            None => config,
        }
    }
}

impl DepthSensingArgs {
    pub fn config(&self, wait: WaitPolicy) -> DepthSensingConfig {
        DepthSensingConfig {
            frames: self.frames,
            init: InitParameters::default()
                .with_resolution(self.resolution)
                .with_depth_mode(self.depth_mode)
                .with_units(self.unit),
            runtime: RuntimeParameters {
                sensing_mode: self.sensing_mode,
            },
            wait,
        }
    }
}

impl SpatialMappingArgs {
    pub fn config(&self, wait: WaitPolicy) -> SpatialMappingConfig {
        let defaults = SpatialMappingConfig::default();
        SpatialMappingConfig {
            frames: self.frames,
            init: defaults.init.with_resolution(self.resolution),
            mapping: SpatialMappingParameters {
                resolution_meter: self.mapping_resolution,
                range_meter: self.mapping_range,
                max_memory_usage_mb: self.max_memory_mb,
            },
            filter: self.filter,
            output: self.output.clone(),
            wait,
            ..defaults
        }
    }
}
