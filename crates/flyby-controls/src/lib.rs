//! Fly-style 6-DOF camera controls driven by keyboard and pointer input.

pub mod fly_controls;
pub mod keymap;

pub use fly_controls::{FlyControls, MoveState};
pub use keymap::{FlyAction, RawKeyEvent, action_for_key, is_speed_modifier};
