//! Depthloop Capture - Camera implementations
//!
//! This crate provides implementations of the `DepthCamera` trait from
//! depthloop-core:
//!
//! - [`SyntheticCamera`]: a deterministic ray-cast stereo camera with tracking
//!   and spatial mapping, used by the CLI and the end-to-end tests
//!
//! ## Example
//!
//! ```ignore
//! use depthloop_capture::{SyntheticCamera, SyntheticConfig};
//! use depthloop_core::pipeline::{DepthSensingConfig, run_depth_sensing};
//!
//! let camera = SyntheticCamera::new(SyntheticConfig::default());
//! run_depth_sensing(camera, &DepthSensingConfig::default(), &mut std::io::stdout())?;
//! ```

pub mod synthetic;

pub use synthetic::{SyntheticCamera, SyntheticConfig};

// Re-export the camera trait for convenience
pub use depthloop_core::ingest::{DepthCamera, DeviceError, ErrorCode};
