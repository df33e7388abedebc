//! Outline stroke drawn around text.

use crate::image::color::Color;

use itertools::Itertools;

/// An outline made of copies of the glyphs shifted by `size` pixels in the
/// eight compass directions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stroke {
    pub size: i32,
    pub color: Color,
}

impl Stroke {
    /// Black outline for a text layer with boldness `bold`, at `factor` times the
    /// layer's nominal resolution. Never thinner than one pixel.
    pub fn outline(bold: i32, factor: u32) -> Self {
        Self {
            size: (bold.saturating_mul(factor as i32)).max(1),
            color: Color::BLACK,
        }
    }

    /// Offsets at which the outline copies are drawn, `(0, 0)` excluded.
    pub fn offsets(&self) -> Vec<(i32, i32)> {
        let s = self.size;
        [-s, 0, s]
            .into_iter()
            .cartesian_product([-s, 0, s])
            .filter(|&(dx, dy)| (dx, dy) != (0, 0))
            .collect()
    }
}
