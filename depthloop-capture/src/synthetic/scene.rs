//! Ray-cast scene for the synthetic camera.
//!
//! World frame is right-handed Y-up in meters. The camera starts at the
//! origin looking down -Z.

use glam::Vec3;

const EPSILON: f32 = 1e-4;
const CHECKER_SIZE: f32 = 0.5;
const BACKGROUND: [u8; 4] = [30, 30, 40, 255];

/// A room: floor plane, back wall with a finite top edge, and one box.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub floor_y: f32,
    pub wall_z: f32,
    pub wall_top: f32,
    pub box_min: Vec3,
    pub box_max: Vec3,
}

/// Closest surface hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Ray parameter. With a direction whose optical-axis component is 1,
    /// this is the depth.
    pub t: f32,
    pub point: Vec3,
    pub rgba: [u8; 4],
}

impl Scene {
    /// Room with the back wall `wall_distance` meters in front of the origin.
    pub fn room(wall_distance: f32) -> Self {
        Self {
            floor_y: -1.2,
            wall_z: -wall_distance,
            wall_top: 1.5,
            box_min: Vec3::new(0.3, -1.2, -wall_distance + 0.5),
            box_max: Vec3::new(0.9, -0.6, -wall_distance + 1.1),
        }
    }

    pub fn background() -> [u8; 4] {
        BACKGROUND
    }

    pub fn cast(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        [
            self.hit_floor(origin, dir),
            self.hit_wall(origin, dir),
            self.hit_box(origin, dir),
        ]
        .into_iter()
        .flatten()
        .min_by(|a, b| a.t.total_cmp(&b.t))
    }

    fn hit_floor(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        if dir.y.abs() < f32::EPSILON {
            return None;
        }
        let t = (self.floor_y - origin.y) / dir.y;
        if t <= EPSILON {
            return None;
        }
        let point = origin + dir * t;
        if point.z < self.wall_z {
            return None;
        }
        let cell = (point.x / CHECKER_SIZE).floor() as i64 + (point.z / CHECKER_SIZE).floor() as i64;
        let rgba = if cell.rem_euclid(2) == 0 {
            [90, 90, 90, 255]
        } else {
            [160, 160, 160, 255]
        };
        Some(Hit { t, point, rgba })
    }

    fn hit_wall(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        if dir.z.abs() < f32::EPSILON {
            return None;
        }
        let t = (self.wall_z - origin.z) / dir.z;
        if t <= EPSILON {
            return None;
        }
        let point = origin + dir * t;
        if point.y < self.floor_y || point.y > self.wall_top {
            return None;
        }
        let stripe = (point.x / CHECKER_SIZE).floor() as i64;
        let rgba = if stripe.rem_euclid(2) == 0 {
            [200, 180, 150, 255]
        } else {
            [170, 150, 120, 255]
        };
        Some(Hit { t, point, rgba })
    }

    /// Slab test against the box.
    fn hit_box(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let inv = dir.recip();
        let t0 = (self.box_min - origin) * inv;
        let t1 = (self.box_max - origin) * inv;
        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();
        if near.is_nan() || far.is_nan() || near > far || far <= EPSILON {
            return None;
        }
        let t = if near > EPSILON { near } else { far };
        Some(Hit {
            t,
            point: origin + dir * t,
            rgba: [180, 60, 40, 255],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_ahead_hits_wall() {
        let scene = Scene::room(3.0);
        let hit = scene.cast(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert_eq!(hit.t, 3.0);
        assert_eq!(hit.point, Vec3::new(0.0, 0.0, -3.0));
    }

    #[test]
    fn test_looking_down_hits_floor() {
        let scene = Scene::room(3.0);
        let hit = scene.cast(Vec3::ZERO, Vec3::new(0.0, -1.0, -0.5)).unwrap();
        assert!((hit.point.y + 1.2).abs() < 1e-5);
        assert!((hit.t - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_above_wall_is_open() {
        let scene = Scene::room(3.0);
        assert!(scene.cast(Vec3::ZERO, Vec3::new(0.0, 1.0, -1.0)).is_none());
    }

    #[test]
    fn test_box_occludes_wall() {
        let scene = Scene::room(3.0);
        let target = (scene.box_min + scene.box_max) * 0.5;
        let hit = scene.cast(Vec3::ZERO, target).unwrap();
        assert_eq!(hit.rgba, [180, 60, 40, 255]);
        assert!(hit.t < 1.0);
    }

    #[test]
    fn test_ray_away_from_scene_misses() {
        let scene = Scene::room(3.0);
        assert!(scene.cast(Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0)).is_none());
    }
}
