//! Depthloop Application
//!
//! Runs one of the two capture programs on the synthetic stereo camera:
//! - `depth-sensing`: distance to the image center for each frame
//! - `spatial-mapping`: map the scene, then export a filtered OBJ mesh
//!
//! Program output goes to stdout, diagnostics to stderr (`RUST_LOG` filters them).

mod cli;

use clap::Parser;
use cli::{Args, Command};
use depthloop_capture::SyntheticCamera;
use depthloop_core::acquisition::WaitPolicy;
use depthloop_core::ingest::DepthCamera;
use depthloop_core::pipeline::{PipelineError, run_depth_sensing, run_spatial_mapping};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Process status for any failed run.
const EXIT_FAILURE: i32 = -1;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let camera = SyntheticCamera::new(args.scene.synthetic_config());
    let mut stdout = std::io::stdout().lock();

    if let Err(e) = run(camera, &args.command, args.wait.policy(), &mut stdout) {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn run<C: DepthCamera>(
    camera: C,
    command: &Command,
    wait: WaitPolicy,
    out: &mut impl Write,
) -> Result<(), PipelineError> {
    match command {
        Command::DepthSensing(opts) => {
            let report = run_depth_sensing(camera, &opts.config(wait), out)?;
            info!(
                "Depth sensing finished: {} frames, {} idle polls",
                report.frames, report.idle_polls
            );
        }
        Command::SpatialMapping(opts) => {
            let report = run_spatial_mapping(camera, &opts.config(wait), out)?;
            info!(
                "Spatial mapping finished: {} frames, mesh with {} vertices and {} triangles at {}",
                report.frames,
                report.mesh.vertices_after,
                report.mesh.triangles_after,
                report.output.display()
            );
        }
    }
    Ok(())
}
