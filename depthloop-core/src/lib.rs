//! Depthloop Core Crate
//!
//! Drives a depth camera through a bounded acquisition loop and turns what it
//! sees into printed measurements or an exported mesh. The camera itself is
//! an injected dependency behind the [`ingest::DepthCamera`] trait.
//!
//! ## Modules
//!
//! - [`ingest`]: Camera interface, parameters and measurement types
//! - [`acquisition`]: The frame loop, wait policy and scoped camera session
//! - [`reconstruction`]: Voxel fusion for cameras that build their own map
//! - [`pipeline`]: The depth sensing and spatial mapping programs

pub mod acquisition;
pub mod ingest;
pub mod pipeline;
pub mod reconstruction;

pub use acquisition::{AcquisitionLoop, CameraSession, WaitPolicy};
pub use ingest::DepthCamera;
pub use pipeline::PipelineError;
