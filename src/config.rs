use crate::camera::{DEFAULT_FOV, DEFAULT_MARGIN_FACTOR};
use crate::shading::DEFAULT_DARKEN_FACTOR;
use crate::world::{DEFAULT_EXTENT, DEFAULT_STEP, MAX_EXTENT, MIN_STEP};

pub const DEFAULT_MAX_RENDER_DISTANCE: f32 = 110.0;

/// Calibration constants for screen-space occlusion. Tuned by eye, not
/// derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionThresholds {
    /// Depth gap required for an overlap occlusion.
    pub overlap_gap: f32,
    /// Occluder box must be at least this fraction of the occluded box.
    pub overlap_size_ratio: f32,
    /// Depth gap required for a center-hit occlusion.
    pub center_gap: f32,
    /// Centers must be closer than this fraction of the occluder size.
    pub center_factor: f32,
    pub center_size_ratio: f32,
}

impl Default for OcclusionThresholds {
    fn default() -> Self {
        Self {
            overlap_gap: 1.0,
            overlap_size_ratio: 0.7,
            center_gap: 0.5,
            center_factor: 0.5,
            center_size_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundOcclusion {
    pub samples: usize,
    pub tolerance: f32,
    /// Objects closer than this are never tested.
    pub min_distance: f32,
}

impl Default for GroundOcclusion {
    fn default() -> Self {
        Self { samples: 15, tolerance: 0.1, min_distance: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub fov: f32,
    pub max_render_distance: f32,
    pub margin_factor: f32,
    pub darken_factor: f32,
    pub terrain_extent: f32,
    pub terrain_step: f32,
    pub shadows: bool,
    pub occlusion_culling: bool,
    pub ground_occlusion: bool,
    pub occlusion: OcclusionThresholds,
    pub ground: GroundOcclusion,
    pub sprite_count: usize,
    pub sprite_size: f32,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV,
            max_render_distance: DEFAULT_MAX_RENDER_DISTANCE,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            darken_factor: DEFAULT_DARKEN_FACTOR,
            terrain_extent: DEFAULT_EXTENT,
            terrain_step: DEFAULT_STEP,
            shadows: true,
            occlusion_culling: true,
            ground_occlusion: true,
            occlusion: OcclusionThresholds::default(),
            ground: GroundOcclusion::default(),
            sprite_count: 100,
            sprite_size: 0.2,
            seed: 0x5eed,
        }
    }
}

/// A single named numeric knob change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigUpdate {
    FieldOfView(f32),
    MaxRenderDistance(f32),
    MarginFactor(f32),
    DarkenFactor(f32),
    TerrainExtent(f32),
    TerrainStep(f32),
}

/// Which parts of the scene an applied update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Unchanged,
    Camera,
    Rendering,
    Terrain,
}

impl ConfigUpdate {
    pub fn from_name(name: &str, value: f32) -> Option<Self> {
        let update = match name {
            "fov" => Self::FieldOfView(value),
            "max-distance" => Self::MaxRenderDistance(value),
            "margin-factor" => Self::MarginFactor(value),
            "darken-factor" => Self::DarkenFactor(value),
            "terrain-extent" => Self::TerrainExtent(value),
            "terrain-step" => Self::TerrainStep(value),
            _ => return None,
        };
        Some(update)
    }
}

impl EngineConfig {
    /// Stores a normalized version of `update`. Values out of range are
    /// clamped, non-finite values are ignored.
    pub fn apply(&mut self, update: ConfigUpdate) -> Effect {
        let (slot, value, min, max, effect) = match update {
            ConfigUpdate::FieldOfView(v) => (&mut self.fov, v, 10.0, 170.0, Effect::Camera),
            ConfigUpdate::MaxRenderDistance(v) => {
                (&mut self.max_render_distance, v, 1.0, f32::MAX, Effect::Rendering)
            }
            ConfigUpdate::MarginFactor(v) => (&mut self.margin_factor, v, 0.0, 2.0, Effect::Camera),
            ConfigUpdate::DarkenFactor(v) => (&mut self.darken_factor, v, 0.0, 1.0, Effect::Rendering),
            ConfigUpdate::TerrainExtent(v) => {
                (&mut self.terrain_extent, v.abs(), 0.0, MAX_EXTENT, Effect::Terrain)
            }
            ConfigUpdate::TerrainStep(v) => (&mut self.terrain_step, v, MIN_STEP, f32::MAX, Effect::Terrain),
        };

        if !value.is_finite() {
            log::warn!("ignoring non-finite {:?}", update);
            return Effect::Unchanged;
        }
        let normalized = value.clamp(min, max);
        if normalized != value {
            log::warn!("{:?} normalized to {}", update, normalized);
        }
        if *slot == normalized {
            return Effect::Unchanged;
        }
        *slot = normalized;
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_updates() {
        assert_eq!(ConfigUpdate::from_name("fov", 60.0), Some(ConfigUpdate::FieldOfView(60.0)));
        assert_eq!(
            ConfigUpdate::from_name("terrain-step", 1.5),
            Some(ConfigUpdate::TerrainStep(1.5))
        );
        assert_eq!(ConfigUpdate::from_name("gravity", 9.8), None);
    }

    #[test]
    fn test_values_are_normalized_not_rejected() {
        let mut config = EngineConfig::default();
        assert_eq!(config.apply(ConfigUpdate::TerrainStep(0.0)), Effect::Terrain);
        assert_eq!(config.terrain_step, MIN_STEP);

        config.apply(ConfigUpdate::FieldOfView(500.0));
        assert_eq!(config.fov, 170.0);

        config.apply(ConfigUpdate::DarkenFactor(-1.0));
        assert_eq!(config.darken_factor, 0.0);

        config.apply(ConfigUpdate::TerrainExtent(-12.0));
        assert_eq!(config.terrain_extent, 12.0);

        assert_eq!(config.apply(ConfigUpdate::TerrainExtent(1e30)), Effect::Terrain);
        assert_eq!(config.terrain_extent, MAX_EXTENT);
    }

    #[test]
    fn test_non_finite_and_repeated_values_change_nothing() {
        let mut config = EngineConfig::default();
        assert_eq!(config.apply(ConfigUpdate::MaxRenderDistance(f32::NAN)), Effect::Unchanged);
        assert_eq!(config.max_render_distance, DEFAULT_MAX_RENDER_DISTANCE);
        assert_eq!(config.apply(ConfigUpdate::FieldOfView(DEFAULT_FOV)), Effect::Unchanged);
        assert_eq!(config.apply(ConfigUpdate::MarginFactor(0.5)), Effect::Camera);
    }

    #[test]
    fn test_calibration_defaults() {
        // Empirical thresholds; changing them changes what counts as hidden.
        let t = OcclusionThresholds::default();
        assert_eq!((t.overlap_gap, t.overlap_size_ratio), (1.0, 0.7));
        assert_eq!((t.center_gap, t.center_factor, t.center_size_ratio), (0.5, 0.5, 0.8));
        assert_eq!(GroundOcclusion::default().samples, 15);
    }
}
