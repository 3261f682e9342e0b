mod camera_controller;
mod renderer;

use anyhow::Context;
use camera_controller::CameraController;
use renderer::{FrameBatch, State};
use scenery::texture::SpriteTexture;
use scenery::{EngineConfig, FrameStats, Scene};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

const GRASS_TEXTURE: &str = "assets/grass.png";
const MOVE_SPEED: f32 = 0.1;
const TURN_SPEED: f32 = 0.02;
const MOUSE_SENSITIVITY: f32 = 0.001;
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Frames-per-second over the last reporting interval.
struct FrameTimer {
    since: Instant,
    frames: u32,
}

impl FrameTimer {
    fn new() -> Self {
        Self { since: Instant::now(), frames: 0 }
    }

    /// Counts a frame; returns the rate once per interval.
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed < STATS_INTERVAL {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        *self = Self::new();
        Some(fps)
    }
}

struct App {
    window: Option<Arc<Window>>,
    state: Option<State>,
    scene: Option<Scene>,
    controller: CameraController,
    timer: FrameTimer,
    last_stats: FrameStats,
}

impl Default for App {
    fn default() -> Self {
        Self {
            window: None,
            state: None,
            scene: None,
            controller: CameraController::new(MOVE_SPEED, TURN_SPEED, MOUSE_SENSITIVITY),
            timer: FrameTimer::new(),
            last_stats: FrameStats::default(),
        }
    }
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title("Scenery");
        let window = Arc::new(event_loop.create_window(window_attributes).context("creating window")?);
        let size = window.inner_size();

        let state = pollster::block_on(State::new(window.clone()))?;
        let texture = SpriteTexture::preload(GRASS_TEXTURE);
        let scene = Scene::new(EngineConfig::default(), size.width, size.height, texture);

        self.window = Some(window);
        self.state = Some(state);
        self.scene = Some(scene);
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let (Some(state), Some(scene)) = (self.state.as_mut(), self.scene.as_mut()) else {
            return Ok(());
        };

        if scene.needs_redraw() {
            let size = state.size();
            let mut batch = FrameBatch::new(size.width, size.height);
            self.last_stats = scene.render(&mut batch);
            state.upload(&batch);
        }
        let result = state.render();

        if let Some(fps) = self.timer.tick() {
            let pose = scene.camera().pose();
            let stats = &self.last_stats;
            log::debug!(
                "pos ({:.1}, {:.1}, {:.1}) | rot {:.0}° | visible {}/{} ({:.1}%) | occluded {} | cells {} | fps {:.0}",
                pose.position.x,
                pose.position.y,
                pose.position.z,
                pose.yaw.to_degrees(),
                stats.visible_sprites,
                stats.total_sprites,
                stats.visible_ratio() * 100.0,
                stats.occluded_sprites,
                stats.drawn_cells,
                fps,
            );
        }
        result
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("failed to start: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta.0, delta.1);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if id != window.id() {
            return;
        }

        let consumed = match self.scene.as_ref() {
            Some(scene) => self.controller.process_events(&event, scene.config()),
            None => false,
        };
        if consumed {
            return;
        }

        match event {
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Right,
                ..
            } => {
                let target = self.scene.as_ref().and_then(|scene| scene.aim_target());
                log::info!("aiming at {:?}", target);
            }
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(state) = self.state.as_mut() {
                    state.resize(physical_size);
                }
                if let Some(scene) = self.scene.as_mut() {
                    scene.resize(physical_size.width, physical_size.height);
                }
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    if let Some(state) = self.state.as_mut() {
                        let size = state.size();
                        state.resize(size);
                    }
                }
                Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                Err(e) => log::warn!("{:?}", e),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.as_mut() {
            for command in self.controller.drain_commands() {
                scene.apply(command);
            }
            scene.update();
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = App::default();
    event_loop.run_app(&mut app)?;
    Ok(())
}
