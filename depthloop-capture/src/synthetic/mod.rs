//! Synthetic stereo depth camera
//!
//! A ray-cast room seen from a camera on a scripted sweep. It implements the
//! full `DepthCamera` interface so both capture programs run without hardware.

mod camera;
mod rig;
mod scene;

pub use camera::{SyntheticCamera, SyntheticConfig};
pub use rig::{StereoRig, Trajectory};
pub use scene::{Hit, Scene};
