pub const DEFAULT_DARKEN_FACTOR: f32 = 0.7;
/// Depth where distance darkening starts.
pub const SHADE_MIN_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From `0xRRGGBB`.
    pub const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Channels decoded from sRGB to linear light.
    pub fn to_linear(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| {
            let c = f32::from(c) / 255.0;
            if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        })
    }

    /// Multiplies every channel by `factor`, truncating.
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let channel = |c: u8| (f32::from(c) * factor).floor() as u8;
        Self::rgb(channel(self.r), channel(self.g), channel(self.b))
    }
}

/// 0 at `min_distance`, 1 at 90% of `max_distance`, clamped.
pub fn distance_factor(depth: f32, min_distance: f32, max_distance: f32) -> f32 {
    let far = max_distance * 0.9;
    let span = far - min_distance;
    if span <= f32::EPSILON {
        return if depth > min_distance { 1.0 } else { 0.0 };
    }
    ((depth - min_distance) / span).clamp(0.0, 1.0)
}

/// Distance-darkened copy of `base`.
pub fn shade(base: Color, depth: f32, max_distance: f32, darken_factor: f32) -> Color {
    let factor = distance_factor(depth, SHADE_MIN_DISTANCE, max_distance);
    base.scaled(1.0 - factor * darken_factor)
}
