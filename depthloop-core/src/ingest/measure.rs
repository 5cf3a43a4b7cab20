//! Per-frame measurements retrieved from a depth camera.

use glam::Vec3;
use image::RgbaImage;
use std::fmt;

/// Which sensor image to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Left,
    Right,
}

/// Which metric measure to retrieve. Both are aligned on the left image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// Depth along the optical axis, one `f32` per pixel.
    Depth,
    /// Colored point cloud, one XYZ + RGBA sample per pixel.
    Xyzrgba,
}

/// One item to fetch from the camera after a successful grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureRequest {
    Image(View),
    Measure(MeasureKind),
}

impl fmt::Display for MeasureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureRequest::Image(View::Left) => f.write_str("left image"),
            MeasureRequest::Image(View::Right) => f.write_str("right image"),
            MeasureRequest::Measure(MeasureKind::Depth) => f.write_str("depth"),
            MeasureRequest::Measure(MeasureKind::Xyzrgba) => f.write_str("point cloud"),
        }
    }
}

/// Row-major 2D grid of per-pixel values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid from row-major data. Returns `None` if the length does
    /// not match `width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get grid dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Value at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

/// Depth map. Invalid pixels are non-finite.
pub type DepthMap = Grid<f32>;

/// One point-cloud sample: position in the camera frame plus color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub position: Vec3,
    pub rgba: [u8; 4],
}

impl PointSample {
    pub fn new(position: Vec3, rgba: [u8; 4]) -> Self {
        Self { position, rgba }
    }

    /// A sample with no valid measurement.
    pub fn invalid() -> Self {
        Self {
            position: Vec3::NAN,
            rgba: [0; 4],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
    }

    /// Euclidean distance from the camera center.
    pub fn distance(&self) -> f32 {
        self.position.length()
    }
}

/// Colored point cloud aligned on the left image.
pub type PointCloudMap = Grid<PointSample>;

/// A measurement retrieved after a successful grab.
///
/// It is an owned snapshot of that frame. A later grab does not change it.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Image(RgbaImage),
    Depth(DepthMap),
    PointCloud(PointCloudMap),
}

impl Measurement {
    /// Get dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Measurement::Image(image) => image.dimensions(),
            Measurement::Depth(depth) => depth.dimensions(),
            Measurement::PointCloud(cloud) => cloud.dimensions(),
        }
    }
}
