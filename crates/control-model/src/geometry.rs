//! Frame geometry, centroids, and detection rectangles.

use serde::{Deserialize, Serialize};

/// Dimensions of the coordinate space detections are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl FrameGeometry {
    /// 1920x1080, the resolution the camera is opened at by default.
    pub const FULL_HD: FrameGeometry = FrameGeometry {
        width: 1920.0,
        height: 1080.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The exact center of the frame.
    pub fn center(&self) -> Centroid {
        Centroid::new(self.width / 2.0, self.height / 2.0)
    }

    /// Extent along the given orientation.
    pub fn extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Whether both dimensions are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// Estimated subject position in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl Centroid {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component along the given orientation.
    pub fn component(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// Detector output rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Center of the box, shifted down by `vertical_offset` pixels.
    ///
    /// A negative offset moves the point up, e.g. to aim at a face inside
    /// an upper-body detection.
    pub fn center(&self, vertical_offset: f64) -> Centroid {
        Centroid::new(self.x + self.w / 2.0, self.y + self.h / 2.0 + vertical_offset)
    }
}

/// Direction a coordinate is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One of the two gimbal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    Pan,
    Tilt,
}

impl AxisId {
    pub const ALL: [AxisId; 2] = [AxisId::Pan, AxisId::Tilt];

    /// Pan follows the horizontal coordinate, tilt the vertical one.
    pub fn orientation(self) -> Orientation {
        match self {
            AxisId::Pan => Orientation::Horizontal,
            AxisId::Tilt => Orientation::Vertical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AxisId::Pan => "pan",
            AxisId::Tilt => "tilt",
        }
    }
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AxisId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pan" => Ok(AxisId::Pan),
            "tilt" => Ok(AxisId::Tilt),
            other => Err(format!("unknown axis '{other}' (expected pan or tilt)")),
        }
    }
}
