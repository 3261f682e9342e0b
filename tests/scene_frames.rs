//! Drives the scene the way the windowed front end does: commands, update,
//! render into a recording canvas.

use approx::assert_relative_eq;
use glam::Vec3;
use scenery::canvas::{DrawCall, Recorder};
use scenery::texture::SpriteTexture;
use scenery::{Command, ConfigUpdate, EngineConfig, Pose, Scene};

fn config() -> EngineConfig {
    EngineConfig {
        terrain_extent: 15.0,
        terrain_step: 2.0,
        sprite_count: 60,
        ..Default::default()
    }
}

fn frame(scene: &mut Scene, commands: &[Command]) -> (scenery::FrameStats, Recorder) {
    for &command in commands {
        scene.apply(command);
    }
    scene.update();
    let mut canvas = Recorder::default();
    let stats = scene.render(&mut canvas);
    (stats, canvas)
}

#[test]
fn test_static_camera_stops_requesting_redraws() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    frame(&mut scene, &[]);
    scene.update();
    assert!(!scene.needs_redraw());

    scene.apply(Command::Rotate { yaw: 0.1, tilt: 0.0 });
    scene.update();
    assert!(scene.needs_redraw());
}

#[test]
fn test_stats_are_consistent() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    let (stats, canvas) = frame(&mut scene, &[Command::IsometricView]);
    assert_eq!(stats.total_sprites, 60);
    assert!(stats.visible_sprites + stats.occluded_sprites <= stats.total_sprites);
    assert!(stats.visible_ratio() <= 1.0);

    let ellipses = canvas
        .calls
        .iter()
        .filter(|c| matches!(c, DrawCall::Ellipse { .. }))
        .count();
    // One shadow plus one fallback circle per drawn sprite.
    assert_eq!(ellipses, stats.visible_sprites * 2);
}

#[test]
fn test_shadow_toggle_removes_shadow_ellipses() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    let (with_shadows, _) = frame(&mut scene, &[]);
    let (without, canvas) = frame(&mut scene, &[Command::ToggleShadows]);
    assert_eq!(with_shadows.visible_sprites, without.visible_sprites);
    let ellipses = canvas
        .calls
        .iter()
        .filter(|c| matches!(c, DrawCall::Ellipse { .. }))
        .count();
    assert_eq!(ellipses, without.visible_sprites);
}

#[test]
fn test_disabling_culling_never_shows_fewer_sprites() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    let (culled, _) = frame(&mut scene, &[]);
    let (unculled, _) = frame(
        &mut scene,
        &[Command::ToggleOcclusion, Command::ToggleGroundOcclusion],
    );
    assert_eq!(unculled.occluded_sprites, 0);
    assert!(unculled.visible_sprites >= culled.visible_sprites);
}

#[test]
fn test_short_render_distance_hides_everything() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    let (stats, canvas) = frame(
        &mut scene,
        &[Command::Configure(ConfigUpdate::MaxRenderDistance(0.0))],
    );
    assert_eq!(scene.config().max_render_distance, 1.0);
    assert_eq!(stats.visible_sprites, 0);
    assert_eq!(canvas.polygons(), stats.drawn_cells);
}

#[test]
fn test_preset_transition_settles_on_target() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    scene.apply(Command::NormalView);
    let mut ticks = 0;
    while scene.camera().is_transitioning() {
        scene.update();
        ticks += 1;
        assert!(ticks < 2000, "transition never settled");
    }
    let target = Pose::normal();
    let pose = scene.camera().pose();
    assert!(pose.position.distance(target.position) < 5.0);
    assert_relative_eq!(pose.yaw, target.yaw, epsilon = 0.01);
    assert_relative_eq!(pose.fov, target.fov, epsilon = 0.01);
}

#[test]
fn test_terrain_regeneration_through_config() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    frame(
        &mut scene,
        &[
            Command::Configure(ConfigUpdate::TerrainExtent(5.0)),
            Command::Configure(ConfigUpdate::TerrainStep(1.0)),
        ],
    );
    assert_eq!(scene.terrain().extent(), 5.0);
    assert_eq!(scene.terrain().step(), 1.0);
    assert_eq!(scene.terrain().cells().len(), 21 * 21);
}

#[test]
fn test_walking_forward_changes_view() {
    let mut scene = Scene::new(config(), 1024, 768, SpriteTexture::Failed);
    frame(&mut scene, &[]);
    let before = scene.camera().position();
    frame(&mut scene, &[Command::Move(Vec3::new(0.0, 0.0, 1.0))]);
    let after = scene.camera().position();
    assert_relative_eq!(Vec3::new(after.x - before.x, 0.0, after.z - before.z).length(), 1.0, epsilon = 1e-4);
}
