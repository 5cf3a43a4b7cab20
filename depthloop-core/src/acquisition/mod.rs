//! Frame acquisition
//!
//! Drives a [`DepthCamera`](crate::ingest::DepthCamera) for a fixed number of
//! frames and owns the camera for the lifetime of a run.

pub mod runner;
pub mod session;
pub mod wait;

pub use runner::{AcquisitionError, AcquisitionLoop, Frame, FrameHandler, HandlerError, LoopSummary};
pub use session::{CameraSession, SessionError};
pub use wait::WaitPolicy;
