//! Fly controls: keyboard translation and roll, pointer-driven pitch and yaw.
//!
//! Input handlers only record which actions are active. All camera motion
//! happens in [`FlyControls::update`], scaled by the frame delta, so motion
//! speed is independent of the frame rate.

use glam::{Quat, Vec3};
use winit::event::{ElementState, MouseButton};

use flyby_config::ControlsConfig;
use flyby_render::PerspectiveCamera;

use crate::keymap::{FlyAction, RawKeyEvent, action_for_key, is_speed_modifier};

/// Movement multiplier while Shift is held.
pub const SLOW_MULTIPLIER: f32 = 0.1;

/// Active strength of every action, each in 0..=1 (pointer look may exceed
/// 1 at the window edge when dragging outside).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveState {
    pub forward: f32,
    pub back: f32,
    pub left: f32,
    pub right: f32,
    pub up: f32,
    pub down: f32,
    pub pitch_up: f32,
    pub pitch_down: f32,
    pub yaw_left: f32,
    pub yaw_right: f32,
    pub roll_left: f32,
    pub roll_right: f32,
}

impl MoveState {
    fn slot(&mut self, action: FlyAction) -> &mut f32 {
        match action {
            FlyAction::Forward => &mut self.forward,
            FlyAction::Back => &mut self.back,
            FlyAction::Left => &mut self.left,
            FlyAction::Right => &mut self.right,
            FlyAction::Up => &mut self.up,
            FlyAction::Down => &mut self.down,
            FlyAction::PitchUp => &mut self.pitch_up,
            FlyAction::PitchDown => &mut self.pitch_down,
            FlyAction::YawLeft => &mut self.yaw_left,
            FlyAction::YawRight => &mut self.yaw_right,
            FlyAction::RollLeft => &mut self.roll_left,
            FlyAction::RollRight => &mut self.roll_right,
        }
    }
}

/// Free-flight camera controller.
#[derive(Debug, Clone)]
pub struct FlyControls {
    /// Translation speed in units per second.
    pub movement_speed: f32,
    /// Rotation speed in radians per second.
    pub roll_speed: f32,
    /// Keep moving forward unless backing up.
    pub auto_forward: bool,
    /// Only look around while a pointer button is held.
    pub drag_to_look: bool,
    state: MoveState,
    speed_multiplier: f32,
    buttons_held: u32,
    move_vector: Vec3,
    rotation_vector: Vec3,
}

impl Default for FlyControls {
    fn default() -> Self {
        Self::from_config(&ControlsConfig::default())
    }
}

impl FlyControls {
    pub fn from_config(config: &ControlsConfig) -> Self {
        let mut controls = Self {
            movement_speed: config.movement_speed,
            roll_speed: config.roll_speed,
            auto_forward: config.auto_forward,
            drag_to_look: config.drag_to_look,
            state: MoveState::default(),
            speed_multiplier: 1.0,
            buttons_held: 0,
            move_vector: Vec3::ZERO,
            rotation_vector: Vec3::ZERO,
        };
        controls.update_movement_vector();
        controls
    }

    /// Process a keyboard event.
    pub fn on_key(&mut self, event: RawKeyEvent) {
        let pressed = event.state == ElementState::Pressed;

        if is_speed_modifier(event.key) {
            self.speed_multiplier = if pressed { SLOW_MULTIPLIER } else { 1.0 };
            return;
        }

        let Some(action) = action_for_key(event.key) else {
            return;
        };
        *self.state.slot(action) = if pressed { 1.0 } else { 0.0 };
        self.update_movement_vector();
        self.update_rotation_vector();
    }

    /// Process a pointer button event.
    pub fn on_pointer_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;

        if self.drag_to_look {
            if pressed {
                self.buttons_held += 1;
            } else {
                self.buttons_held = self.buttons_held.saturating_sub(1);
                self.state.yaw_left = 0.0;
                self.state.pitch_down = 0.0;
            }
        } else {
            let value = if pressed { 1.0 } else { 0.0 };
            match button {
                MouseButton::Left => self.state.forward = value,
                MouseButton::Right => self.state.back = value,
                _ => {}
            }
            self.update_movement_vector();
        }

        self.update_rotation_vector();
    }

    /// Process a pointer move in physical pixels within a `width`×`height` viewport.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, width: u32, height: u32) {
        if self.drag_to_look && self.buttons_held == 0 {
            return;
        }
        let half_w = (width.max(1) as f32) / 2.0;
        let half_h = (height.max(1) as f32) / 2.0;

        self.state.yaw_left = -((x as f32) - half_w) / half_w;
        self.state.pitch_down = ((y as f32) - half_h) / half_h;
        self.update_rotation_vector();
    }

    /// Drop all held input, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.state = MoveState::default();
        self.speed_multiplier = 1.0;
        self.buttons_held = 0;
        self.update_movement_vector();
        self.update_rotation_vector();
        tracing::debug!("Fly controls input reset");
    }

    /// Integrate the current input over `delta` seconds into the camera.
    pub fn update(&self, delta: f32, camera: &mut PerspectiveCamera) {
        let delta = delta.max(0.0);
        let move_mult = delta * self.movement_speed * self.speed_multiplier;
        let rot_mult = delta * self.roll_speed;

        camera.translate_local(self.move_vector * move_mult);

        let r = self.rotation_vector * rot_mult;
        camera.rotate_local(Quat::from_xyzw(r.x, r.y, r.z, 1.0).normalize());
    }

    pub fn state(&self) -> &MoveState {
        &self.state
    }

    /// Camera-space translation direction (x right, y up, z back).
    pub fn move_vector(&self) -> Vec3 {
        self.move_vector
    }

    /// Camera-space rotation rates (x pitch, y yaw, z roll).
    pub fn rotation_vector(&self) -> Vec3 {
        self.rotation_vector
    }

    pub fn is_dragging(&self) -> bool {
        self.buttons_held > 0
    }

    fn update_movement_vector(&mut self) {
        let s = &self.state;
        let forward = if s.forward > 0.0 || (self.auto_forward && s.back == 0.0) {
            1.0
        } else {
            0.0
        };
        self.move_vector = Vec3::new(-s.left + s.right, -s.down + s.up, -forward + s.back);
    }

    fn update_rotation_vector(&mut self) {
        let s = &self.state;
        self.rotation_vector = Vec3::new(
            -s.pitch_down + s.pitch_up,
            -s.yaw_right + s.yaw_left,
            -s.roll_right + s.roll_left,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::{KeyCode, PhysicalKey};

    fn key(code: KeyCode, state: ElementState) -> RawKeyEvent {
        RawKeyEvent {
            key: PhysicalKey::Code(code),
            state,
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(25.0, 1.0, 50.0, 1e7)
    }

    #[test]
    fn test_defaults() {
        let controls = FlyControls::default();
        assert_eq!(controls.movement_speed, 100.0);
        assert!((controls.roll_speed - std::f32::consts::PI / 24.0).abs() < 1e-7);
        assert!(controls.drag_to_look);
        assert!(!controls.auto_forward);
        assert_eq!(controls.move_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_no_input_leaves_camera_still() {
        let controls = FlyControls::default();
        let mut cam = camera();
        controls.update(0.5, &mut cam);
        assert_eq!(cam.position, Vec3::ZERO);
        assert!(cam.rotation.abs_diff_eq(Quat::IDENTITY, 1e-7));
    }

    #[test]
    fn test_forward_moves_along_view_direction() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyW, ElementState::Pressed));
        let mut cam = camera();
        controls.update(0.5, &mut cam);
        assert!((cam.position - Vec3::new(0.0, 0.0, -50.0)).length() < 1e-4);
    }

    #[test]
    fn test_release_stops_motion() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyD, ElementState::Pressed));
        controls.on_key(key(KeyCode::KeyD, ElementState::Released));
        assert_eq!(controls.move_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyR, ElementState::Pressed));
        controls.on_key(key(KeyCode::KeyF, ElementState::Pressed));
        assert_eq!(controls.move_vector().y, 0.0);
    }

    #[test]
    fn test_shift_slows_movement() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::ShiftLeft, ElementState::Pressed));
        controls.on_key(key(KeyCode::KeyA, ElementState::Pressed));
        let mut cam = camera();
        controls.update(1.0, &mut cam);
        assert!((cam.position - Vec3::new(-10.0, 0.0, 0.0)).length() < 1e-4);

        controls.on_key(key(KeyCode::ShiftLeft, ElementState::Released));
        let mut cam = camera();
        controls.update(1.0, &mut cam);
        assert!((cam.position - Vec3::new(-100.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_auto_forward_until_back_pressed() {
        let mut controls = FlyControls {
            auto_forward: true,
            ..FlyControls::default()
        };
        controls.on_key(key(KeyCode::KeyQ, ElementState::Pressed));
        assert_eq!(controls.move_vector().z, -1.0);
        controls.on_key(key(KeyCode::KeyS, ElementState::Pressed));
        assert_eq!(controls.move_vector().z, 1.0);
    }

    #[test]
    fn test_roll_rotates_about_view_axis() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyQ, ElementState::Pressed));
        let mut cam = camera();
        controls.update(1.0, &mut cam);
        // Rolling keeps the view direction.
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((cam.up() - Vec3::Y).length() > 1e-3);
        assert!((cam.rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_ignored_without_drag() {
        let mut controls = FlyControls::default();
        controls.on_pointer_move(0.0, 0.0, 800, 600);
        assert_eq!(controls.rotation_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_drag_to_look_maps_pointer_offset() {
        let mut controls = FlyControls::default();
        controls.on_pointer_button(MouseButton::Left, ElementState::Pressed);
        assert!(controls.is_dragging());
        // Left edge, vertically centered: full yaw left.
        controls.on_pointer_move(0.0, 300.0, 800, 600);
        assert_eq!(controls.state().yaw_left, 1.0);
        assert_eq!(controls.state().pitch_down, 0.0);
        assert_eq!(controls.rotation_vector(), Vec3::new(0.0, 1.0, 0.0));

        controls.on_pointer_button(MouseButton::Left, ElementState::Released);
        assert!(!controls.is_dragging());
        assert_eq!(controls.rotation_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_buttons_move_when_not_drag_to_look() {
        let mut controls = FlyControls {
            drag_to_look: false,
            ..FlyControls::default()
        };
        controls.on_pointer_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(controls.move_vector().z, -1.0);
        controls.on_pointer_button(MouseButton::Left, ElementState::Released);
        controls.on_pointer_button(MouseButton::Right, ElementState::Pressed);
        assert_eq!(controls.move_vector().z, 1.0);
        // Pointer look is always live in this mode.
        controls.on_pointer_move(800.0, 600.0, 800, 600);
        assert_eq!(controls.rotation_vector().x, -1.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyW, ElementState::Pressed));
        controls.on_key(key(KeyCode::ShiftRight, ElementState::Pressed));
        controls.on_pointer_button(MouseButton::Left, ElementState::Pressed);
        controls.reset();
        assert_eq!(*controls.state(), MoveState::default());
        assert!(!controls.is_dragging());
        assert_eq!(controls.move_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut controls = FlyControls::default();
        controls.on_key(key(KeyCode::KeyW, ElementState::Pressed));
        let mut cam = camera();
        controls.update(-1.0, &mut cam);
        assert_eq!(cam.position, Vec3::ZERO);
    }
}
