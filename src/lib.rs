//! Pseudo-3D scene engine: a yaw/tilt camera projecting points and quads onto
//! a 2D canvas, a procedural terrain height field, and a per-frame visibility
//! pipeline deciding which sprites get drawn.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod entity;
pub mod scene;
pub mod shading;
pub mod texture;
pub mod trig;
pub mod visibility;
pub mod world;

pub use camera::{Camera, Pose, ProjectedPoint, Transition};
pub use canvas::Canvas;
pub use config::{ConfigUpdate, EngineConfig};
pub use scene::{Command, FrameStats, Scene};
pub use world::HeightField;
