use serde::{Deserialize, Serialize};

/// A point in normalized image coordinates: centered at the image midpoint
/// and scaled by `1 / max(width, height)`, so one pixel of the source image
/// spans one `1/max` unit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert a raw pixel-space coordinate to normalized space for the
    /// given frame resolution.
    pub fn from_pixel(px: f64, py: f64, width: u32, height: u32) -> Self {
        let scale = width.max(height).max(1) as f64;
        Self {
            x: (px - width as f64 / 2.0) / scale,
            y: (py - height as f64 / 2.0) / scale,
        }
    }
}

/// An ordered polygon boundary in normalized coordinates.
///
/// A region is immutable once attached to a zone; vertex count and cell
/// size are validated when the zone's mask is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    vertices: Vec<Point>,
}

impl Region {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle helper, vertices in counter-clockwise order.
    pub fn rect(min: Point, max: Point) -> Self {
        Self::new(vec![
            Point::new(min.x, min.y),
            Point::new(max.x, min.y),
            Point::new(max.x, max.y),
            Point::new(min.x, max.y),
        ])
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }
}
