//! Colour ramps for scalar rasters.

use rayon::prelude::*;

/// Color value in RGBA format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

/// Evenly spaced colour stops over `[0, 1]` with linear blending between.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<Color>,
}

/// Yellow-orange-red sequential scheme (ColorBrewer YlOrRd, 9 classes).
const YLORRD: [Color; 9] = [
    Color::opaque(255, 255, 204),
    Color::opaque(255, 237, 160),
    Color::opaque(254, 217, 118),
    Color::opaque(254, 178, 76),
    Color::opaque(253, 141, 60),
    Color::opaque(252, 78, 42),
    Color::opaque(227, 26, 28),
    Color::opaque(189, 0, 38),
    Color::opaque(128, 0, 38),
];

impl ColorRamp {
    /// Ramp through `stops`; at least one stop is required.
    pub fn new(stops: Vec<Color>) -> Option<Self> {
        (!stops.is_empty()).then_some(Self { stops })
    }

    /// Low values pale yellow, high values dark red.
    pub fn ylorrd() -> Self {
        Self {
            stops: YLORRD.to_vec(),
        }
    }

    /// Colour at normalized position `t` (clamped to `[0, 1]`).
    pub fn color_at(&self, t: f32) -> Color {
        let last = self.stops.len() - 1;
        if last == 0 {
            return self.stops[0];
        }

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last - 1);
        interpolate_color(self.stops[i], self.stops[i + 1], pos - i as f32)
    }

    /// RGBA pixels for a row-major grid scaled linearly to `[min, max]`.
    ///
    /// NaN cells are transparent. A zero range maps every value to the low
    /// end of the ramp.
    pub fn render(&self, data: &[f32], min: f32, max: f32) -> Vec<u8> {
        let range = max - min;
        let scale = if range > 0.0 { 1.0 / range } else { 0.0 };

        data.par_iter()
            .flat_map_iter(|&v| {
                let c = if v.is_nan() {
                    Color::transparent()
                } else {
                    self.color_at((v - min) * scale)
                };
                [c.r, c.g, c.b, c.a]
            })
            .collect()
    }
}

/// Linear color interpolation.
fn interpolate_color(c1: Color, c2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::new(mix(c1.r, c2.r), mix(c1.g, c2.g), mix(c1.b, c2.b), mix(c1.a, c2.a))
}

/// Range of the non-NaN values, `None` when there are none.
pub fn finite_range(data: &[f32]) -> Option<(f32, f32)> {
    data.iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
