//! Stereo pinhole rig and its scripted motion.

use depthloop_core::ingest::{Pose, Resolution, View};
use glam::{Quat, Vec3};
use std::f32::consts::TAU;

/// Pinhole intrinsics shared by both views, plus the stereo baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoRig {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    /// Distance from the left to the right optical center, in meters.
    pub baseline: f32,
}

impl StereoRig {
    /// 90 degree horizontal field of view, principal point at
    /// `(width / 2, height / 2)` so the center pixel looks straight ahead.
    pub fn new(resolution: Resolution, baseline: f32) -> Self {
        let (width, height) = resolution.dimensions();
        let focal = width as f32 * 0.5;
        Self {
            width,
            height,
            fx: focal,
            fy: focal,
            cx: (width / 2) as f32,
            cy: (height / 2) as f32,
            baseline,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Ray through pixel `(u, v)` in image convention (x right, y down,
    /// z forward), scaled so its z component is 1.
    pub fn pixel_ray(&self, u: u32, v: u32) -> Vec3 {
        Vec3::new(
            (u as f32 - self.cx) / self.fx,
            (v as f32 - self.cy) / self.fy,
            1.0,
        )
    }

    /// Optical center of `view` in the left camera's right-handed Y-up frame.
    pub fn view_offset(&self, view: View) -> Vec3 {
        match view {
            View::Left => Vec3::ZERO,
            View::Right => Vec3::new(self.baseline, 0.0, 0.0),
        }
    }
}

/// Image convention to right-handed Y-up. The map is its own inverse.
pub fn image_to_y_up(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.y, -v.z)
}

/// Lateral sweep with a counter-yaw that keeps the camera facing the room
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub origin: Vec3,
    pub amplitude: f32,
    pub period_secs: f32,
    pub yaw_amplitude: f32,
}

impl Trajectory {
    pub fn pose_at(&self, secs: f32) -> Pose {
        let phase = if self.period_secs > 0.0 {
            (TAU * secs / self.period_secs).sin()
        } else {
            0.0
        };
        Pose::new(
            self.origin + Vec3::new(self.amplitude * phase, 0.0, 0.0),
            Quat::from_rotation_y(self.yaw_amplitude * phase),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_looks_forward() {
        let rig = StereoRig::new(Resolution::Hd720, 0.12);
        assert_eq!(rig.pixel_ray(640, 360), Vec3::Z);
        let rig = StereoRig::new(Resolution::Vga, 0.12);
        assert_eq!(rig.pixel_ray(336, 188), Vec3::Z);
    }

    #[test]
    fn test_corner_ray_spans_field_of_view() {
        let rig = StereoRig::new(Resolution::Hd720, 0.12);
        let ray = rig.pixel_ray(0, 0);
        assert_eq!(ray.x, -1.0);
        assert_eq!(ray.y, -0.5625);
    }

    #[test]
    fn test_trajectory_starts_at_origin() {
        let trajectory = Trajectory {
            origin: Vec3::ZERO,
            amplitude: 0.25,
            period_secs: 4.0,
            yaw_amplitude: 0.1,
        };
        assert_eq!(trajectory.pose_at(0.0), Pose::IDENTITY);
        let quarter = trajectory.pose_at(1.0);
        assert!((quarter.position.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_axis_flip_is_involution() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(image_to_y_up(v), Vec3::new(1.0, -2.0, -3.0));
        assert_eq!(image_to_y_up(image_to_y_up(v)), v);
    }
}
