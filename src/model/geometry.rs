//! Page geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page coordinates (points, origin top-left, y grows
/// downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BoundingBox {
    /// Create a bounding box from its edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Area of the box.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Width divided by height, or 0 when the box has no height.
    pub fn aspect_ratio(&self) -> f32 {
        let height = self.height();
        if height == 0.0 {
            0.0
        } else {
            self.width() / height
        }
    }

    /// Whether `x1 >= x0` and `y1 >= y0`.
    pub fn is_well_formed(&self) -> bool {
        self.x1 >= self.x0 && self.y1 >= self.y0
    }

    /// Return the box with inverted edges swapped, so width and height are
    /// never negative.
    pub fn normalized(self) -> Self {
        if !self.is_well_formed() {
            log::debug!("Repairing inverted bounding box {:?}", self);
        }
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Whether a point lies inside the box (edges included).
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(edges: [f32; 4]) -> Self {
        Self::new(edges[0], edges[1], edges[2], edges[3])
    }
}
