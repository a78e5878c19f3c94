//! Fixed key bindings.
//!
//! Physical key codes are used so that the movement cluster sits in the same
//! place regardless of the user's keyboard layout.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Minimal description of a key event for processing.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// The physical key involved.
    pub key: PhysicalKey,
    /// Whether the key was pressed or released.
    pub state: ElementState,
    /// Whether this is a repeat event.
    pub repeat: bool,
}

impl From<&KeyEvent> for RawKeyEvent {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        }
    }
}

/// One component of the camera movement vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAxis {
    /// Strafe; positive is right.
    X,
    /// Vertical; positive is world up.
    Y,
    /// Depth; negative is forward.
    Z,
}

/// A scene switch flipped on a key-press edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    NormalMapping,
    OrenNayar,
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move { axis: MoveAxis, sign: i32 },
    Toggle(Toggle),
}

/// Look up the action bound to a physical key.
#[must_use]
pub fn action_for(key: PhysicalKey) -> Option<KeyAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let movement = |axis, sign| Some(KeyAction::Move { axis, sign });
    match code {
        KeyCode::KeyW => movement(MoveAxis::Z, -1),
        KeyCode::KeyS => movement(MoveAxis::Z, 1),
        KeyCode::KeyA => movement(MoveAxis::X, -1),
        KeyCode::KeyD => movement(MoveAxis::X, 1),
        KeyCode::KeyR => movement(MoveAxis::Y, 1),
        KeyCode::KeyF => movement(MoveAxis::Y, -1),
        KeyCode::KeyN => Some(KeyAction::Toggle(Toggle::NormalMapping)),
        KeyCode::KeyO => Some(KeyAction::Toggle(Toggle::OrenNayar)),
        _ => None,
    }
}
