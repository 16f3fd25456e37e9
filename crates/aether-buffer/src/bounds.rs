//! Axis-aligned bounds over the visible range.

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Component-wise minimum.
    pub min: [f32; 3],
    /// Component-wise maximum.
    pub max: [f32; 3],
}

impl Bounds {
    /// Degenerate bounds around a single point.
    #[must_use]
    pub const fn from_point(p: [f32; 3]) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to include `p`. NaN components are ignored.
    pub fn include(&mut self, p: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Radius of the sphere that encloses the box, centered on [`Self::center`].
    #[must_use]
    pub fn radius(&self) -> f32 {
        let dx = self.max[0] - self.min[0];
        let dy = self.max[1] - self.min[1];
        let dz = self.max[2] - self.min[2];
        (dx * dx + dy * dy + dz * dz).sqrt() * 0.5
    }
}
