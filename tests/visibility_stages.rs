use glam::Vec3;
use scenery::config::{GroundOcclusion, OcclusionThresholds};
use scenery::entity::{Entity, EntityId};
use scenery::shading::Color;
use scenery::texture::SpriteTexture;
use scenery::visibility::{FrameContext, VisibilityPipeline, VisibilitySettings};
use scenery::{Camera, HeightField, Pose};

fn sprite(id: u32, position: Vec3, size: f32) -> Entity {
    Entity::sprite(EntityId(id), position, size, Color::WHITE, SpriteTexture::Failed)
}

fn settings(max_render_distance: f32) -> VisibilitySettings {
    VisibilitySettings {
        max_render_distance,
        occlusion_culling: true,
        ground_occlusion: false,
        thresholds: OcclusionThresholds::default(),
        ground: GroundOcclusion::default(),
    }
}

#[test]
fn test_render_distance_boundary() {
    let terrain = HeightField::new(5.0, 1.0);
    let camera = Camera::new(Pose::new(Vec3::ZERO, 0.0, 0.0, 80.0), 800, 600);
    let entities = [
        sprite(1, Vec3::new(0.0, 0.0, 9.99), 0.2),
        sprite(2, Vec3::new(0.0, 0.0, 10.01), 0.2),
    ];
    let pipeline = VisibilityPipeline::new(settings(10.0));
    let report = pipeline.run(&entities, &FrameContext { camera: &camera, terrain: &terrain });
    assert_eq!(report.in_range, 1);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].entity.id, EntityId(1));
}

#[test]
fn test_nearer_larger_sprite_hides_farther_one() {
    let terrain = HeightField::new(5.0, 1.0);
    let camera = Camera::new(Pose::new(Vec3::ZERO, 0.0, 0.0, 80.0), 800, 600);
    let entities = [
        sprite(1, Vec3::new(0.0, 0.0, 5.0), 1.0),
        sprite(2, Vec3::new(0.0, 0.0, 3.0), 0.9),
        sprite(3, Vec3::new(2.0, 0.0, 6.0), 0.5),
    ];
    let pipeline = VisibilityPipeline::new(settings(100.0));
    let report = pipeline.run(&entities, &FrameContext { camera: &camera, terrain: &terrain });

    let ids: Vec<_> = report.entries.iter().map(|e| e.entity.id.0).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(report.occluded, 1);
}

#[test]
fn test_buried_sprite_is_hidden_by_ground() {
    let terrain = HeightField::new(20.0, 1.0);
    let (x, z) = (10.0, 20.0);
    let target = Vec3::new(x, terrain.height_at(x, z) - 3.0, z);
    // Level with the target so it projects onto the screen center.
    let camera = Camera::new(Pose::new(Vec3::new(x, target.y, 0.0), 0.0, 0.0, 80.0), 800, 600);
    let entities = [sprite(1, target, 0.5)];

    let mut settings = settings(100.0);
    settings.ground_occlusion = true;
    let report = VisibilityPipeline::new(settings.clone())
        .run(&entities, &FrameContext { camera: &camera, terrain: &terrain });
    assert!(report.entries.is_empty());
    assert_eq!(report.occluded, 1);

    settings.ground_occlusion = false;
    let report = VisibilityPipeline::new(settings)
        .run(&entities, &FrameContext { camera: &camera, terrain: &terrain });
    assert_eq!(report.entries.len(), 1);
}
