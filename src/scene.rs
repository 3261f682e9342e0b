use crate::camera::{Camera, Pose};
use crate::canvas::Canvas;
use crate::config::{ConfigUpdate, Effect, EngineConfig};
use crate::entity::{Entity, EntityId, EntityKind};
use crate::shading::{Color, shade};
use crate::texture::SpriteTexture;
use crate::trig::AngleCache;
use crate::visibility::{FrameContext, ScreenBox, VisibilityPipeline, VisibilitySettings};
use crate::world::HeightField;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::sync::Arc;

pub const TERRAIN_COLOR: Color = Color::hex(0x99ff99);
pub const GRASS_COLOR: Color = Color::hex(0x00ff00);
const SHADOW_COLOR: Color = Color::hex(0x224422);
const OUTLINE_ALPHA: f32 = 0.1;
const EYE_CLEARANCE: f32 = 0.5;
const SPAWN_CLEARANCE: f32 = 2.0;
/// Sprites smaller than this many pixels are not drawn.
const MIN_SPRITE_PIXELS: f32 = 0.5;
/// Projected positions outside this window are treated as garbage.
const SCREEN_SANITY: (f32, f32) = (-1000.0, 3000.0);

pub fn start_pose(fov: f32) -> Pose {
    Pose::new(Vec3::new(1.0, 2.0, 10.0), 3.0, 0.0, fov)
}

/// Input vocabulary the scene understands. Raw device events are turned into
/// these elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move(Vec3),
    Rotate { yaw: f32, tilt: f32 },
    IsometricView,
    NormalView,
    ToggleShadows,
    ToggleOcclusion,
    ToggleGroundOcclusion,
    Configure(ConfigUpdate),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub total_sprites: usize,
    pub visible_sprites: usize,
    pub occluded_sprites: usize,
    pub drawn_cells: usize,
}

impl FrameStats {
    pub fn visible_ratio(&self) -> f32 {
        if self.total_sprites == 0 {
            0.0
        } else {
            self.visible_sprites as f32 / self.total_sprites as f32
        }
    }
}

pub struct Scene {
    config: EngineConfig,
    angles: Arc<AngleCache>,
    camera: Camera,
    terrain: HeightField,
    entities: Vec<Entity>,
    pipeline: VisibilityPipeline,
    next_id: u32,
    drawn: Vec<(EntityId, ScreenBox)>,
    dirty: bool,
}

impl Scene {
    /// Builds the terrain and scatters `config.sprite_count` sprites sharing
    /// `texture`, which must already be preloaded.
    pub fn new(config: EngineConfig, width: u32, height: u32, texture: SpriteTexture) -> Self {
        let angles = Arc::new(AngleCache::default());
        let mut camera = Camera::new(start_pose(config.fov), width, height).with_angle_cache(angles.clone());
        camera.set_margin_factor(config.margin_factor);

        let mut scene = Self {
            terrain: HeightField::new(config.terrain_extent, config.terrain_step),
            pipeline: VisibilityPipeline::new(VisibilitySettings::from(&config)),
            angles,
            camera,
            entities: Vec::new(),
            next_id: 0,
            drawn: Vec::new(),
            dirty: true,
            config,
        };
        scene.populate(scene.config.sprite_count, texture);
        scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn terrain(&self) -> &HeightField {
        &self.terrain
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.dirty = true;
    }

    pub fn spawn_sprite(&mut self, position: Vec3, size: f32, color: Color, texture: SpriteTexture) -> EntityId {
        let texture = match texture {
            SpriteTexture::Loading => {
                log::warn!("sprite spawned before its texture finished loading; drawing untextured");
                SpriteTexture::Failed
            }
            other => other,
        };
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity::sprite(id, position, size, color, texture));
        self.dirty = true;
        id
    }

    /// Scatters sprites on the terrain around the origin, away from the
    /// camera start.
    pub fn populate(&mut self, count: usize, texture: SpriteTexture) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let spawn_radius = self.config.terrain_extent * 1.5;
        let start = start_pose(self.config.fov).position;
        let size = self.config.sprite_size;

        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < count * 20 {
            attempts += 1;
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(0.0..1.0f32) * spawn_radius;
            let x = self.angles.ultra_fast_cos(angle) * distance;
            let z = self.angles.ultra_fast_sin(angle) * distance;
            let position = Vec3::new(x, self.terrain.height_at(x, z), z);

            if position.distance(start) < SPAWN_CLEARANCE {
                continue;
            }
            self.spawn_sprite(position, size, GRASS_COLOR, texture);
            placed += 1;
        }
        if placed < count {
            log::warn!("placed {placed} of {count} sprites");
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Move(delta) => self.camera.move_by(delta),
            Command::Rotate { yaw, tilt } => self.camera.rotate(yaw, tilt),
            Command::IsometricView if !self.camera.is_transitioning() => self.camera.isometric_view(),
            Command::NormalView if !self.camera.is_transitioning() => self.camera.normal_view(),
            Command::IsometricView | Command::NormalView => return,
            Command::ToggleShadows => {
                self.config.shadows = !self.config.shadows;
                log::info!("shadows {}", on_off(self.config.shadows));
            }
            Command::ToggleOcclusion => {
                self.config.occlusion_culling = !self.config.occlusion_culling;
                log::info!("occlusion culling {}", on_off(self.config.occlusion_culling));
                self.pipeline.settings = VisibilitySettings::from(&self.config);
            }
            Command::ToggleGroundOcclusion => {
                self.config.ground_occlusion = !self.config.ground_occlusion;
                log::info!("ground occlusion {}", on_off(self.config.ground_occlusion));
                self.pipeline.settings = VisibilitySettings::from(&self.config);
            }
            Command::Configure(update) => self.configure(update),
        }
        self.dirty = true;
    }

    fn configure(&mut self, update: ConfigUpdate) {
        match self.config.apply(update) {
            Effect::Unchanged => {}
            Effect::Camera => {
                self.camera.set_fov(self.config.fov);
                self.camera.set_margin_factor(self.config.margin_factor);
            }
            Effect::Rendering => {
                self.pipeline.settings = VisibilitySettings::from(&self.config);
            }
            Effect::Terrain => {
                self.terrain
                    .regenerate(self.config.terrain_extent, self.config.terrain_step);
                for entity in &mut self.entities {
                    let p = entity.position;
                    entity.position.y = self.terrain.height_at(p.x, p.z);
                }
            }
        }
    }

    /// Advances the camera one tick and keeps it above the ground.
    pub fn update(&mut self) {
        self.camera.update();
        let p = self.camera.position();
        let floor = self.terrain.height_at(p.x, p.z) + EYE_CLEARANCE;
        if p.y < floor {
            self.camera.clamp_above(floor);
            self.dirty = true;
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.camera.moved_this_frame()
    }

    /// Sprite drawn under the center of the viewport in the last frame.
    pub fn aim_target(&self) -> Option<EntityId> {
        let center = self.camera.viewport() * 0.5;
        self.drawn
            .iter()
            .rev()
            .find(|(_, bounds)| bounds.contains(center))
            .map(|(id, _)| *id)
    }

    /// Draws terrain, then shadows, then sprites back to front.
    pub fn render(&mut self, canvas: &mut impl Canvas) -> FrameStats {
        let mut stats = FrameStats {
            total_sprites: self.entities.iter().filter(|e| e.is_sprite()).count(),
            drawn_cells: self.draw_terrain(canvas),
            ..Default::default()
        };

        let ctx = FrameContext { camera: &self.camera, terrain: &self.terrain };
        let report = self.pipeline.run(&self.entities, &ctx);
        stats.occluded_sprites = report.occluded;

        let max_distance = self.config.max_render_distance;
        let darken = self.config.darken_factor;

        let mut drawn = Vec::with_capacity(report.entries.len());
        for entry in &report.entries {
            let (EntityKind::Sprite(sprite), Some(projected)) = (&entry.entity.kind, entry.projected) else {
                continue;
            };
            let size = sprite.size * projected.scale;
            let anchor = projected.screen;
            let sane = |v: f32| v >= SCREEN_SANITY.0 && v <= SCREEN_SANITY.1;
            if size < MIN_SPRITE_PIXELS || !sane(anchor.x) || !sane(anchor.y) {
                continue;
            }
            drawn.push((entry.entity.id, anchor, size, projected.depth, sprite));
        }

        if self.config.shadows {
            for &(_, anchor, size, depth, _) in &drawn {
                let color = shade(SHADOW_COLOR, depth, max_distance, darken);
                canvas.fill_ellipse(anchor, Vec2::new(size * 0.5, size * 0.15), color);
            }
        }

        let mut bounds = Vec::with_capacity(drawn.len());
        for &(id, anchor, size, depth, sprite) in &drawn {
            match &sprite.texture {
                SpriteTexture::Ready(info) => {
                    let scale = sprite.billboard_scale(size);
                    let extent = Vec2::new(info.width as f32, info.height as f32) * scale;
                    canvas.place_billboard(anchor, extent, shade(info.tint, depth, max_distance, darken));
                    bounds.push((id, ScreenBox::billboard(anchor, extent)));
                }
                _ => {
                    let color = shade(sprite.color, depth, max_distance, darken);
                    canvas.fill_ellipse(anchor, Vec2::splat(size), color);
                    bounds.push((id, ScreenBox::circle(anchor, size)));
                }
            }
        }

        stats.visible_sprites = drawn.len();
        self.drawn = bounds;
        self.dirty = false;
        stats
    }

    fn draw_terrain(&self, canvas: &mut impl Canvas) -> usize {
        let max_distance = self.config.max_render_distance;
        let mut drawn = 0;
        let mut points = Vec::with_capacity(4);

        for cell in self.terrain.cells() {
            let projected: Vec<_> = cell
                .corners()
                .iter()
                .filter_map(|&corner| self.camera.project(corner))
                .collect();
            if projected.len() < 3 || !projected.iter().any(|p| p.is_visible) {
                continue;
            }

            let depth = projected.iter().map(|p| p.depth).sum::<f32>() / projected.len() as f32;
            if depth > max_distance {
                continue;
            }

            points.clear();
            points.extend(projected.iter().map(|p| p.screen));
            let color = shade(TERRAIN_COLOR, depth, max_distance, self.config.darken_factor);
            canvas.fill_polygon(&points, color);
            canvas.stroke_polygon(&points, Color::BLACK, OUTLINE_ALPHA);
            drawn += 1;
        }
        drawn
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCall, Recorder};
    use crate::texture::TextureInfo;

    fn small_config() -> EngineConfig {
        EngineConfig {
            terrain_extent: 10.0,
            terrain_step: 2.0,
            sprite_count: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_populate_places_sprites_on_ground() {
        let scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        assert_eq!(scene.entities().len(), 20);
        let start = start_pose(80.0).position;
        for entity in scene.entities() {
            let p = entity.position;
            assert_eq!(p.y, scene.terrain().height_at(p.x, p.z));
            assert!(p.distance(start) >= SPAWN_CLEARANCE);
            assert!(Vec2::new(p.x, p.z).length() <= 15.0 + 1e-3);
        }
    }

    #[test]
    fn test_population_is_seeded() {
        let a = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        let b = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        assert_eq!(a.entities(), b.entities());
    }

    #[test]
    fn test_toggles_and_presets() {
        let mut scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        scene.apply(Command::ToggleShadows);
        assert!(!scene.config().shadows);
        scene.apply(Command::ToggleOcclusion);
        assert!(!scene.config().occlusion_culling);

        scene.apply(Command::IsometricView);
        assert!(scene.camera().is_transitioning());
        scene.apply(Command::NormalView);
        // Ignored while the first preset is still running.
        match scene.camera().transition() {
            crate::camera::Transition::Transitioning { target, .. } => {
                assert_eq!(*target, Pose::isometric());
            }
            crate::camera::Transition::Idle => panic!("transition dropped"),
        }
        scene.apply(Command::Move(Vec3::X));
        assert!(!scene.camera().is_transitioning());
    }

    #[test]
    fn test_terrain_config_regenerates_and_reseats() {
        let mut scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        scene.apply(Command::Configure(ConfigUpdate::TerrainStep(1.0)));
        assert_eq!(scene.terrain().step(), 1.0);
        for entity in scene.entities() {
            let p = entity.position;
            assert_eq!(p.y, scene.terrain().height_at(p.x, p.z));
        }
    }

    #[test]
    fn test_fov_update_reaches_camera() {
        let mut scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        scene.apply(Command::Configure(ConfigUpdate::FieldOfView(60.0)));
        assert_eq!(scene.camera().pose().fov, 60.0);
    }

    #[test]
    fn test_camera_clamped_above_ground() {
        let mut scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        scene.apply(Command::Move(Vec3::new(0.0, -100.0, 0.0)));
        scene.update();
        let p = scene.camera().position();
        assert!(p.y >= scene.terrain().height_at(p.x, p.z));
    }

    #[test]
    fn test_render_draws_untextured_sprites_as_circles() {
        let mut config = small_config();
        config.sprite_count = 0;
        config.shadows = false;
        let mut scene = Scene::new(config, 800, 600, SpriteTexture::Failed);
        let camera = scene.camera().position();
        let yaw = scene.camera().pose().yaw;
        let forward = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
        let id = scene.spawn_sprite(camera + forward * 4.0, 1.0, GRASS_COLOR, SpriteTexture::Failed);
        scene.update();

        let mut canvas = Recorder::default();
        let stats = scene.render(&mut canvas);
        assert_eq!(stats.visible_sprites, 1);
        assert!(canvas.calls.iter().any(|c| matches!(c, DrawCall::Ellipse { .. })));
        assert!(stats.drawn_cells > 0);
        assert_eq!(canvas.polygons(), stats.drawn_cells);
        assert_eq!(scene.aim_target(), Some(id));
        assert!(!scene.needs_redraw());
    }

    fn aim_scene() -> (Scene, Vec3) {
        let mut config = small_config();
        config.sprite_count = 0;
        config.ground_occlusion = false;
        let mut scene = Scene::new(config, 800, 600, SpriteTexture::Failed);
        scene.update();
        let yaw = scene.camera().pose().yaw;
        let ahead = scene.camera().position() + Vec3::new(-yaw.sin(), 0.0, yaw.cos()) * 4.0;
        (scene, ahead)
    }

    #[test]
    fn test_aim_uses_drawn_circle_bounds() {
        let (mut scene, ahead) = aim_scene();
        // Anchor sits above the view center, inside the circle's lower half.
        let id = scene.spawn_sprite(ahead + Vec3::Y * 0.3, 1.0, GRASS_COLOR, SpriteTexture::Failed);
        scene.render(&mut Recorder::default());
        assert_eq!(scene.aim_target(), Some(id));
    }

    #[test]
    fn test_aim_uses_drawn_billboard_bounds() {
        let (mut scene, ahead) = aim_scene();
        let tall = SpriteTexture::Ready(TextureInfo { width: 32, height: 64, tint: Color::WHITE });
        // Only the upper half of the two-units-tall billboard covers the center.
        let id = scene.spawn_sprite(ahead - Vec3::Y * 1.5, 1.0, GRASS_COLOR, tall);
        let mut canvas = Recorder::default();
        scene.render(&mut canvas);
        assert!(canvas.calls.iter().any(|c| matches!(c, DrawCall::Billboard { .. })));
        assert_eq!(scene.aim_target(), Some(id));
    }

    #[test]
    fn test_huge_terrain_extent_is_capped() {
        let mut scene = Scene::new(small_config(), 800, 600, SpriteTexture::Failed);
        scene.apply(Command::Configure(ConfigUpdate::TerrainExtent(1e30)));
        assert_eq!(scene.config().terrain_extent, crate::world::MAX_EXTENT);
        assert_eq!(scene.terrain().extent(), crate::world::MAX_EXTENT);
    }
}
