use crate::shading::Color;
use crate::texture::SpriteTexture;
use crate::world::Cell;
use glam::Vec3;

/// Texture width the sprite scale is measured against when there is no
/// decoded texture.
pub const NOMINAL_TEXTURE_WIDTH: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    /// World-space size; also the radius used for occlusion boxes.
    pub size: f32,
    pub color: Color,
    pub texture: SpriteTexture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainQuad {
    pub corners: [Vec3; 4],
}

impl From<&Cell> for TerrainQuad {
    fn from(cell: &Cell) -> Self {
        Self { corners: cell.corners() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Sprite(Sprite),
    TerrainCell(TerrainQuad),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Ground contact point for sprites, center for terrain cells.
    pub position: Vec3,
    pub kind: EntityKind,
}

impl Entity {
    pub fn sprite(id: EntityId, position: Vec3, size: f32, color: Color, texture: SpriteTexture) -> Self {
        Self {
            id,
            position,
            kind: EntityKind::Sprite(Sprite { size, color, texture }),
        }
    }

    pub fn terrain_cell(id: EntityId, cell: &Cell) -> Self {
        Self {
            id,
            position: cell.center(),
            kind: EntityKind::TerrainCell(TerrainQuad::from(cell)),
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match &self.kind {
            EntityKind::Sprite(sprite) => Some(sprite),
            EntityKind::TerrainCell(_) => None,
        }
    }

    pub fn is_sprite(&self) -> bool {
        matches!(self.kind, EntityKind::Sprite(_))
    }

    /// World radius used for screen-space occlusion boxes.
    pub fn radius(&self) -> f32 {
        match &self.kind {
            EntityKind::Sprite(sprite) => sprite.size,
            EntityKind::TerrainCell(quad) => quad
                .corners
                .iter()
                .map(|c| c.distance(self.position))
                .fold(0.0, f32::max),
        }
    }
}

impl Sprite {
    /// Billboard scale for a sprite drawn `projected_size` pixels tall.
    pub fn billboard_scale(&self, projected_size: f32) -> f32 {
        let width = match &self.texture {
            SpriteTexture::Ready(info) => info.width.max(1) as f32,
            _ => NOMINAL_TEXTURE_WIDTH,
        };
        (projected_size / width).max(0.1)
    }
}
