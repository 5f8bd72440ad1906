//! Physical key bindings for the fly controls.
//!
//! Physical key codes are used so that WASD movement works identically
//! regardless of the user's keyboard layout.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Minimal description of a key event for processing.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// The physical key involved.
    pub key: PhysicalKey,
    /// Whether the key was pressed or released.
    pub state: ElementState,
}

impl From<&KeyEvent> for RawKeyEvent {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key: event.physical_key,
            state: event.state,
        }
    }
}

/// One axis half of the fly controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlyAction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
}

/// Map a physical key to the action it drives, if any.
pub fn action_for_key(key: PhysicalKey) -> Option<FlyAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW => FlyAction::Forward,
        KeyCode::KeyS => FlyAction::Back,
        KeyCode::KeyA => FlyAction::Left,
        KeyCode::KeyD => FlyAction::Right,
        KeyCode::KeyR => FlyAction::Up,
        KeyCode::KeyF => FlyAction::Down,
        KeyCode::ArrowUp => FlyAction::PitchUp,
        KeyCode::ArrowDown => FlyAction::PitchDown,
        KeyCode::ArrowLeft => FlyAction::YawLeft,
        KeyCode::ArrowRight => FlyAction::YawRight,
        KeyCode::KeyQ => FlyAction::RollLeft,
        KeyCode::KeyE => FlyAction::RollRight,
        _ => return None,
    };
    Some(action)
}

/// Shift slows movement down while held.
pub fn is_speed_modifier(key: PhysicalKey) -> bool {
    matches!(
        key,
        PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight)
    )
}
