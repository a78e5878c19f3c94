//! Input for the free-look camera: key bindings, held movement axes, pending
//! pointer motion, and cursor capture.

pub mod keyboard;
pub mod pointer;
pub mod state;

pub use keyboard::{KeyAction, MoveAxis, RawKeyEvent, Toggle, action_for};
pub use pointer::PointerCapture;
pub use state::InputState;
