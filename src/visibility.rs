//! Per-frame visibility: distance, frustum, screen-space occlusion and
//! terrain occlusion, in that order.
//!
//! Nothing here keeps state between frames. Every stage takes the survivors
//! of the previous one and returns a subset; an entity that fails to project
//! is simply dropped for the frame.

use crate::camera::{Camera, ProjectedPoint};
use crate::config::{DEFAULT_MAX_RENDER_DISTANCE, EngineConfig, GroundOcclusion, OcclusionThresholds};
use crate::entity::Entity;
use crate::world::HeightField;
use glam::{Vec2, Vec3};

/// Read-only view of the world a frame is evaluated against.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub terrain: &'a HeightField,
}

#[derive(Debug, Clone, Copy)]
pub struct VisibleEntry<'a> {
    pub entity: &'a Entity,
    /// Euclidean distance from the camera.
    pub distance: f32,
    pub projected: Option<ProjectedPoint>,
}

/// Screen rectangle of a billboard: centered horizontally, bottom edge on the
/// projected ground contact point, square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl ScreenBox {
    pub fn around(anchor: Vec2, size: f32) -> Self {
        let half = size * 0.5;
        Self {
            left: anchor.x - half,
            right: anchor.x + half,
            top: anchor.y - size,
            bottom: anchor.y,
        }
    }

    /// Bounds of a quad standing on `anchor`.
    pub fn billboard(anchor: Vec2, extent: Vec2) -> Self {
        let half = extent.x * 0.5;
        Self {
            left: anchor.x - half,
            right: anchor.x + half,
            top: anchor.y - extent.y,
            bottom: anchor.y,
        }
    }

    /// Bounds of a circle centred on `center`.
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            left: center.x - radius,
            right: center.x + radius,
            top: center.y - radius,
            bottom: center.y + radius,
        }
    }

    pub fn size(&self) -> f32 {
        self.right - self.left
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    pub fn overlaps(&self, other: &ScreenBox) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// Whether the box of a farther entity is hidden by a nearer one.
///
/// `gap` is the farther distance minus the nearer distance.
pub fn occludes(near: &ScreenBox, far: &ScreenBox, gap: f32, thresholds: &OcclusionThresholds) -> bool {
    let near_size = near.size();
    let far_size = far.size();

    let overlap_hit = near.overlaps(far)
        && gap > thresholds.overlap_gap
        && near_size >= far_size * thresholds.overlap_size_ratio;

    let center_hit = gap > thresholds.center_gap
        && near.center().distance(far.center()) < near_size * thresholds.center_factor
        && near_size >= far_size * thresholds.center_size_ratio;

    overlap_hit || center_hit
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilitySettings {
    pub max_render_distance: f32,
    pub occlusion_culling: bool,
    pub ground_occlusion: bool,
    pub thresholds: OcclusionThresholds,
    pub ground: GroundOcclusion,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            max_render_distance: DEFAULT_MAX_RENDER_DISTANCE,
            occlusion_culling: true,
            ground_occlusion: true,
            thresholds: OcclusionThresholds::default(),
            ground: GroundOcclusion::default(),
        }
    }
}

impl From<&EngineConfig> for VisibilitySettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_render_distance: config.max_render_distance,
            occlusion_culling: config.occlusion_culling,
            ground_occlusion: config.ground_occlusion,
            thresholds: config.occlusion,
            ground: config.ground,
        }
    }
}

#[derive(Debug, Default)]
pub struct VisibilityReport<'a> {
    /// Survivors, farthest first.
    pub entries: Vec<VisibleEntry<'a>>,
    /// Entities that passed the distance stage.
    pub in_range: usize,
    /// Entities that passed the frustum but were removed by an occlusion stage.
    pub occluded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityPipeline {
    pub settings: VisibilitySettings,
}

impl VisibilityPipeline {
    pub fn new(settings: VisibilitySettings) -> Self {
        Self { settings }
    }

    pub fn run<'a>(&self, entities: &'a [Entity], ctx: &FrameContext<'_>) -> VisibilityReport<'a> {
        let mut entries = distance_filter(entities, ctx.camera.position(), self.settings.max_render_distance);
        let in_range = entries.len();

        frustum_filter(&mut entries, ctx.camera);
        let framed = entries.len();

        if self.settings.occlusion_culling {
            occlusion_filter(&mut entries, &self.settings.thresholds);
        }
        if self.settings.ground_occlusion {
            ground_filter(&mut entries, ctx, &self.settings.ground);
        }

        VisibilityReport {
            occluded: framed - entries.len(),
            in_range,
            entries,
        }
    }
}

/// Keeps entities strictly closer than `max_distance`, farthest first.
pub fn distance_filter<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    origin: Vec3,
    max_distance: f32,
) -> Vec<VisibleEntry<'a>> {
    let mut entries: Vec<_> = entities
        .into_iter()
        .filter_map(|entity| {
            let distance = entity.position.distance(origin);
            (distance < max_distance).then_some(VisibleEntry { entity, distance, projected: None })
        })
        .collect();
    entries.sort_by(|a, b| b.distance.total_cmp(&a.distance));
    entries
}

/// Projects every entry and drops those behind the near plane or outside the
/// margin-expanded viewport.
pub fn frustum_filter(entries: &mut Vec<VisibleEntry<'_>>, camera: &Camera) {
    entries.retain_mut(|entry| {
        entry.projected = camera.project(entry.entity.position);
        entry.projected.is_some_and(|p| p.is_visible)
    });
}

/// Screen box of a projected entry, if it takes part in occlusion.
pub fn screen_box(entry: &VisibleEntry<'_>) -> Option<ScreenBox> {
    let projected = entry.projected?;
    if !entry.entity.is_sprite() {
        return None;
    }
    Some(ScreenBox::around(projected.screen, entry.entity.radius() * projected.scale))
}

/// Removes sprites hidden behind nearer sprites. Expects farthest-first order.
pub fn occlusion_filter(entries: &mut Vec<VisibleEntry<'_>>, thresholds: &OcclusionThresholds) {
    let boxes: Vec<Option<ScreenBox>> = entries.iter().map(screen_box).collect();

    let hidden: Vec<bool> = (0..entries.len())
        .map(|i| {
            let Some(far) = &boxes[i] else {
                return false;
            };
            let far_distance = entries[i].distance;
            entries
                .iter()
                .zip(&boxes)
                .enumerate()
                .filter(|&(j, (near, _))| j != i && near.distance < far_distance)
                .any(|(_, (near, near_box))| {
                    near_box
                        .as_ref()
                        .is_some_and(|b| occludes(b, far, far_distance - near.distance, thresholds))
                })
        })
        .collect();

    let mut flags = hidden.into_iter();
    entries.retain(|_| !flags.next().unwrap_or(false));
}

/// Whether terrain blocks the straight line from `eye` to `target`.
pub fn terrain_blocks(terrain: &HeightField, eye: Vec3, target: Vec3, ground: &GroundOcclusion) -> bool {
    if eye.distance(target) < ground.min_distance {
        return false;
    }
    if target.y < terrain.height_at(target.x, target.z) {
        return true;
    }

    let steps = ground.samples + 1;
    (1..steps).any(|i| {
        let sample = eye.lerp(target, i as f32 / steps as f32);
        terrain.height_at(sample.x, sample.z) > sample.y + ground.tolerance
    })
}

/// Removes sprites whose line of sight from the camera passes under the
/// terrain.
pub fn ground_filter(entries: &mut Vec<VisibleEntry<'_>>, ctx: &FrameContext<'_>, ground: &GroundOcclusion) {
    let eye = ctx.camera.position();
    entries.retain(|entry| {
        !entry.entity.is_sprite() || !terrain_blocks(ctx.terrain, eye, entry.entity.position, ground)
    });
}
