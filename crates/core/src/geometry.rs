//! Coordinate value types
//!
//! All stored geometry lives in normalized percentage space: coordinates are
//! fractions (0-100) of the plan's rendered dimensions, independent of the
//! actual raster resolution. Pixel space exists only at the measurement and
//! hit-testing boundary and is never persisted.

/// Resolution-independent plan coordinate
///
/// Both axes range over 0-100, expressed as a percentage of the container's
/// rendered width and height at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// Create a new normalized point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Project into pixel space against the given container dimensions
    pub fn to_pixels(&self, container: ContainerSize) -> PixelPoint {
        PixelPoint {
            x: self.x / 100.0 * container.width,
            y: self.y / 100.0 * container.height,
        }
    }
}

/// Evaluation-time pixel coordinate
///
/// Only meaningful relative to the container size it was projected with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    /// Euclidean distance to another pixel coordinate
    pub fn distance_to(&self, other: &PixelPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Rendered plan surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    /// Create a new container size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
