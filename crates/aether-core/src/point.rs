//! The point sample shared by the wire protocol and the point buffer.

use serde::{Deserialize, Serialize};

/// One reconstructed 3D sample: a position and an 8-bit RGB color.
///
/// Serializes as the flat wire object `{x, y, z, r, g, b}`. A color channel
/// outside `0..=255` fails deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl PointSample {
    /// Build a sample from a position and a color.
    #[must_use]
    pub const fn new(position: [f32; 3], color: [u8; 3]) -> Self {
        Self {
            x: position[0],
            y: position[1],
            z: position[2],
            r: color[0],
            g: color[1],
            b: color[2],
        }
    }

    /// Position as `[x, y, z]`.
    #[must_use]
    pub const fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Color as `[r, g, b]`.
    #[must_use]
    pub const fn color(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}
