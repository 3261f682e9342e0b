use glam::Vec3;
use scenery::{Command, ConfigUpdate, EngineConfig};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{Key, KeyCode, NamedKey, PhysicalKey};

const FOV_STEP: f32 = 5.0;
const DISTANCE_STEP: f32 = 10.0;

/// Turns window events into scene commands.
#[derive(Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    turn_left: bool,
    turn_right: bool,
    is_left_mouse_pressed: bool,

    speed: f32,
    rotation_speed: f32,
    mouse_sensitivity: f32,

    mouse_delta_x: f32,
    mouse_delta_y: f32,
    pending: Vec<Command>,
}

impl CameraController {
    pub fn new(speed: f32, rotation_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            speed,
            rotation_speed,
            mouse_sensitivity,
            ..Default::default()
        }
    }

    pub fn process_events(&mut self, event: &WindowEvent, config: &EngineConfig) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => self.process_key(key_event, config),
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Left {
                    self.is_left_mouse_pressed = *state == ElementState::Pressed;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.is_left_mouse_pressed {
            self.mouse_delta_x += delta_x as f32;
            self.mouse_delta_y += delta_y as f32;
        }
    }

    /// Commands for this tick: one-shot presses first, then held keys and
    /// accumulated mouse motion.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        let mut commands = std::mem::take(&mut self.pending);

        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        let direction = Vec3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.forward, self.backward),
        );
        if direction != Vec3::ZERO {
            commands.push(Command::Move(direction * self.speed));
        }

        let mut yaw = -self.mouse_delta_x * self.mouse_sensitivity;
        let tilt = self.mouse_delta_y * self.mouse_sensitivity;
        yaw += axis(self.turn_left, self.turn_right) * self.rotation_speed;
        if yaw != 0.0 || tilt != 0.0 {
            commands.push(Command::Rotate { yaw, tilt });
        }

        self.mouse_delta_x = 0.0;
        self.mouse_delta_y = 0.0;
        commands
    }

    fn process_key(&mut self, key_event: &KeyEvent, config: &EngineConfig) -> bool {
        let pressed = key_event.state == ElementState::Pressed;

        if let Key::Named(named) = &key_event.logical_key {
            match named {
                NamedKey::ArrowLeft => {
                    self.turn_left = pressed;
                    return true;
                }
                NamedKey::ArrowRight => {
                    self.turn_right = pressed;
                    return true;
                }
                _ => {}
            }
        }

        let PhysicalKey::Code(code) = key_event.physical_key else {
            return false;
        };
        let held = match code {
            KeyCode::KeyW => Some(&mut self.forward),
            KeyCode::KeyS => Some(&mut self.backward),
            KeyCode::KeyA => Some(&mut self.left),
            KeyCode::KeyD => Some(&mut self.right),
            KeyCode::Space => Some(&mut self.up),
            KeyCode::ShiftLeft => Some(&mut self.down),
            _ => None,
        };
        if let Some(flag) = held {
            *flag = pressed;
            return true;
        }

        if !pressed || key_event.repeat {
            return false;
        }
        let command = match code {
            KeyCode::KeyI => Command::IsometricView,
            KeyCode::KeyO => Command::NormalView,
            KeyCode::KeyH => Command::ToggleShadows,
            KeyCode::KeyC => Command::ToggleOcclusion,
            KeyCode::KeyG => Command::ToggleGroundOcclusion,
            KeyCode::BracketLeft => Command::Configure(ConfigUpdate::FieldOfView(config.fov - FOV_STEP)),
            KeyCode::BracketRight => Command::Configure(ConfigUpdate::FieldOfView(config.fov + FOV_STEP)),
            KeyCode::Minus => Command::Configure(ConfigUpdate::MaxRenderDistance(
                config.max_render_distance - DISTANCE_STEP,
            )),
            KeyCode::Equal => Command::Configure(ConfigUpdate::MaxRenderDistance(
                config.max_render_distance + DISTANCE_STEP,
            )),
            _ => return false,
        };
        self.pending.push(command);
        true
    }
}
