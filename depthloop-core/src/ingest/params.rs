//! Camera configuration: what is fixed at open time and what can change per grab.

use strum::{Display, EnumString, IntoStaticStr};

/// Sensor output resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Resolution {
    Hd2k,
    Hd1080,
    #[default]
    Hd720,
    Vga,
}

impl Resolution {
    /// Image size (width, height) in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Hd2k => (2208, 1242),
            Resolution::Hd1080 => (1920, 1080),
            Resolution::Hd720 => (1280, 720),
            Resolution::Vga => (672, 376),
        }
    }

    /// Default frame rate for this resolution.
    pub fn default_fps(self) -> u32 {
        match self {
            Resolution::Hd2k => 15,
            Resolution::Hd1080 => 30,
            Resolution::Hd720 => 60,
            Resolution::Vga => 100,
        }
    }
}

/// Depth computation quality. `None` disables depth entirely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DepthMode {
    None,
    #[default]
    Performance,
    Quality,
    Ultra,
}

/// Unit used for every metric value returned by the camera.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Unit {
    #[default]
    Millimeter,
    Centimeter,
    Meter,
}

impl Unit {
    /// How many of this unit make one meter.
    pub fn per_meter(self) -> f32 {
        match self {
            Unit::Millimeter => 1000.0,
            Unit::Centimeter => 100.0,
            Unit::Meter => 1.0,
        }
    }

    /// Short symbol for printing.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
        }
    }
}

/// Axis convention for 3D values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CoordinateSystem {
    /// x right, y down, z forward.
    #[default]
    Image,
    /// x right, y up, z backward.
    #[strum(serialize = "right-handed-y-up")]
    RightHandedYUp,
}

/// Parameters fixed when the camera is opened.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InitParameters {
    pub resolution: Resolution,
    pub depth_mode: DepthMode,
    pub coordinate_units: Unit,
    pub coordinate_system: CoordinateSystem,
}

impl InitParameters {
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_depth_mode(mut self, depth_mode: DepthMode) -> Self {
        self.depth_mode = depth_mode;
        self
    }

    pub fn with_units(mut self, units: Unit) -> Self {
        self.coordinate_units = units;
        self
    }

    pub fn with_coordinate_system(mut self, system: CoordinateSystem) -> Self {
        self.coordinate_system = system;
        self
    }
}

/// How invalid depth pixels are reported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SensingMode {
    /// Invalid pixels stay invalid (non-finite).
    #[default]
    Standard,
    /// Invalid pixels are filled so every pixel carries a value.
    Fill,
}

/// Parameters that apply to a single grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeParameters {
    pub sensing_mode: SensingMode,
}
