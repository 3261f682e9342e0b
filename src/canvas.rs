use crate::shading::Color;
use glam::Vec2;

/// 2D drawing surface the scene renders into. Coordinates are screen pixels
/// with y growing downward.
pub trait Canvas {
    fn fill_polygon(&mut self, points: &[Vec2], color: Color);

    fn stroke_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32);

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color);

    /// Billboard whose bottom edge is centered on `anchor`.
    fn place_billboard(&mut self, anchor: Vec2, size: Vec2, tint: Color);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Polygon { points: Vec<Vec2>, color: Color },
    Outline { points: Vec<Vec2>, color: Color, alpha: f32 },
    Ellipse { center: Vec2, radii: Vec2, color: Color },
    Billboard { anchor: Vec2, size: Vec2, tint: Color },
}

/// Canvas that just remembers what it was asked to draw.
///
/// Test support: lets scene output be asserted on without a GPU. Public so
/// integration tests and headless callers can use it; nothing in the engine
/// draws through it.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<DrawCall>,
}

impl Recorder {
    pub fn polygons(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Polygon { .. })).count()
    }
}

impl Canvas for Recorder {
    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        self.calls.push(DrawCall::Polygon { points: points.to_vec(), color });
    }

    fn stroke_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32) {
        self.calls.push(DrawCall::Outline { points: points.to_vec(), color, alpha });
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        self.calls.push(DrawCall::Ellipse { center, radii, color });
    }

    fn place_billboard(&mut self, anchor: Vec2, size: Vec2, tint: Color) {
        self.calls.push(DrawCall::Billboard { anchor, size, tint });
    }
}
