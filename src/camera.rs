use crate::trig::AngleCache;
use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

pub const NEAR_CLIP: f32 = 0.01;
pub const TILT_LIMIT: f32 = FRAC_PI_2 - 0.1;
pub const DEFAULT_FOV: f32 = 80.0;
pub const DEFAULT_MARGIN_FACTOR: f32 = 0.2;
pub const TRANSITION_BLEND: f32 = 0.05;
const POSITION_SETTLE: f32 = 5.0;
const ANGLE_SETTLE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Radians about the vertical axis.
    pub yaw: f32,
    /// Radians about the horizontal axis.
    pub tilt: f32,
    /// Degrees.
    pub fov: f32,
}

impl Pose {
    pub fn new(position: Vec3, yaw: f32, tilt: f32, fov: f32) -> Self {
        Self { position, yaw, tilt: clamp_tilt(tilt), fov }
    }

    pub fn isometric() -> Self {
        Self::new(Vec3::new(34.0, 63.0, 41.0), 2.36, 0.76, 40.0)
    }

    pub fn normal() -> Self {
        Self::new(Vec3::new(10.0, 6.0, 33.0), 3.0, 0.0, 50.0)
    }

    fn blend_toward(&mut self, target: &Pose, factor: f32) {
        self.position += (target.position - self.position) * factor;
        self.yaw += (target.yaw - self.yaw) * factor;
        self.tilt += (target.tilt - self.tilt) * factor;
        self.fov += (target.fov - self.fov) * factor;
    }

    fn settled_on(&self, target: &Pose) -> bool {
        self.position.distance(target.position) < POSITION_SETTLE
            && (self.yaw - target.yaw).abs() < ANGLE_SETTLE
            && (self.tilt - target.tilt).abs() < ANGLE_SETTLE
            && (self.fov - target.fov).abs() < ANGLE_SETTLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Idle,
    Transitioning { target: Pose, blend: f32 },
}

/// A world point seen through the camera. Only valid for the frame it was
/// computed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub screen: Vec2,
    /// Camera-space depth, always above the near clip.
    pub depth: f32,
    /// Pixels per world unit at this depth.
    pub scale: f32,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Basis {
    sin_yaw: f32,
    cos_yaw: f32,
    sin_tilt: f32,
    cos_tilt: f32,
}

pub struct Camera {
    pose: Pose,
    width: f32,
    height: f32,
    margin_factor: f32,
    focal_length: f32,
    basis: Basis,
    transition: Transition,
    angles: Option<Arc<AngleCache>>,
    last_tick: (Pose, f32),
    moved: bool,
}

impl Camera {
    pub fn new(pose: Pose, width: u32, height: u32) -> Self {
        let mut camera = Self {
            pose: Pose::new(pose.position, pose.yaw, pose.tilt, pose.fov),
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            focal_length: 1.0,
            basis: Basis { sin_yaw: 0.0, cos_yaw: 1.0, sin_tilt: 0.0, cos_tilt: 1.0 },
            transition: Transition::Idle,
            angles: None,
            last_tick: (pose, 0.0),
            moved: true,
        };
        camera.refresh_focal_length();
        camera.refresh_basis();
        camera.last_tick = (camera.pose, camera.focal_length);
        camera
    }

    /// Rotation basis from the shared lookup tables instead of `sin_cos`.
    pub fn with_angle_cache(mut self, angles: Arc<AngleCache>) -> Self {
        self.angles = Some(angles);
        self.refresh_basis();
        self
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn margin_factor(&self) -> f32 {
        self.margin_factor
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.transition, Transition::Transitioning { .. })
    }

    /// Whether the pose or focal length changed during the last `update`.
    pub fn moved_this_frame(&self) -> bool {
        self.moved
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
        self.refresh_focal_length();
    }

    pub fn set_fov(&mut self, degrees: f32) {
        if self.pose.fov != degrees {
            self.pose.fov = degrees;
            self.refresh_focal_length();
        }
    }

    pub fn set_margin_factor(&mut self, factor: f32) {
        self.margin_factor = factor;
    }

    pub fn screen_margin(&self) -> f32 {
        self.width.min(self.height) * self.margin_factor
    }

    /// World point into camera space: translate, yaw, then tilt.
    pub fn to_camera_space(&self, point: Vec3) -> Vec3 {
        let d = point - self.pose.position;
        let Basis { sin_yaw, cos_yaw, sin_tilt, cos_tilt } = self.basis;

        let x1 = d.x * cos_yaw - d.z * sin_yaw;
        let z1 = d.x * sin_yaw + d.z * cos_yaw;
        let y1 = d.y;

        let y2 = y1 * cos_tilt - z1 * sin_tilt;
        let z2 = y1 * sin_tilt + z1 * cos_tilt;
        Vec3::new(x1, y2, z2)
    }

    /// Perspective projection with a near-plane clamp. `None` when the point
    /// is behind the near plane or lands on a non-finite screen position.
    pub fn project(&self, point: Vec3) -> Option<ProjectedPoint> {
        let view = self.to_camera_space(point);
        if !(view.z >= NEAR_CLIP) {
            return None;
        }

        let scale = self.focal_length / view.z;
        let screen = Vec2::new(
            self.width * 0.5 + view.x * scale,
            self.height * 0.5 - view.y * scale,
        );
        if !screen.is_finite() {
            return None;
        }

        let margin = self.screen_margin();
        let is_visible = screen.x >= -margin
            && screen.x <= self.width + margin
            && screen.y >= -margin
            && screen.y <= self.height + margin;

        Some(ProjectedPoint { screen, depth: view.z, scale, is_visible })
    }

    /// Relative move; `delta.z` is along the view direction.
    pub fn move_by(&mut self, delta: Vec3) {
        let (sin, cos) = self.pose.yaw.sin_cos();
        self.pose.position.x += delta.x * cos - delta.z * sin;
        self.pose.position.z += delta.x * sin + delta.z * cos;
        self.pose.position.y += delta.y;
        self.transition = Transition::Idle;
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_tilt: f32) {
        self.transition = Transition::Idle;
        self.pose.yaw += delta_yaw;
        self.pose.tilt = clamp_tilt(self.pose.tilt + delta_tilt);
        self.refresh_basis();
    }

    /// Starts blending toward `target`, replacing any running transition.
    pub fn transition_to(&mut self, target: Pose) {
        let target = Pose::new(target.position, target.yaw, target.tilt, target.fov);
        self.transition = Transition::Transitioning { target, blend: TRANSITION_BLEND };
    }

    pub fn isometric_view(&mut self) {
        self.transition_to(Pose::isometric());
    }

    pub fn normal_view(&mut self) {
        self.transition_to(Pose::normal());
    }

    /// Keeps the camera at or above `min_y`. Leaves any transition running.
    pub fn clamp_above(&mut self, min_y: f32) {
        if self.pose.position.y < min_y {
            self.pose.position.y = min_y;
        }
    }

    /// Advances a running transition one tick and records whether the pose
    /// changed since the previous tick.
    pub fn update(&mut self) {
        if let Transition::Transitioning { target, blend } = self.transition {
            let fov = self.pose.fov;
            self.pose.blend_toward(&target, blend);
            self.pose.tilt = clamp_tilt(self.pose.tilt);
            if self.pose.fov != fov {
                self.refresh_focal_length();
            }
            self.refresh_basis();

            if self.pose.settled_on(&target) {
                self.transition = Transition::Idle;
            }
        }

        let current = (self.pose, self.focal_length);
        self.moved = current != self.last_tick;
        self.last_tick = current;
    }

    fn refresh_focal_length(&mut self) {
        self.focal_length = self.width * 0.5 / (self.pose.fov.to_radians() * 0.5).tan();
    }

    fn refresh_basis(&mut self) {
        let (sin_yaw, cos_yaw, sin_tilt, cos_tilt) = match self.angles.as_deref() {
            Some(angles) => {
                let (sy, cy) = angles.precise_sin_cos(-self.pose.yaw);
                let (st, ct) = angles.precise_sin_cos(-self.pose.tilt);
                (sy, cy, st, ct)
            }
            None => {
                let (sy, cy) = (-self.pose.yaw).sin_cos();
                let (st, ct) = (-self.pose.tilt).sin_cos();
                (sy, cy, st, ct)
            }
        };
        self.basis = Basis { sin_yaw, cos_yaw, sin_tilt, cos_tilt };
    }
}

fn clamp_tilt(tilt: f32) -> f32 {
    tilt.clamp(-TILT_LIMIT, TILT_LIMIT)
}
