//! Held movement axes and pending pointer motion.
//!
//! [`InputState`] is fed by the event loop and drained once per frame by the
//! camera controller.

use glam::{IVec3, Vec2};
use winit::event::ElementState;

use crate::keyboard::{KeyAction, MoveAxis, RawKeyEvent, Toggle, action_for};

/// Movement axes in {-1, 0, 1} plus pointer motion not yet applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    axes: IVec3,
    pointer_delta: Vec2,
}

fn component(axes: &mut IVec3, axis: MoveAxis) -> &mut i32 {
    match axis {
        MoveAxis::X => &mut axes.x,
        MoveAxis::Y => &mut axes.y,
        MoveAxis::Z => &mut axes.z,
    }
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current movement vector.
    #[must_use]
    pub fn axes(&self) -> IVec3 {
        self.axes
    }

    /// Key-down: the latest press on an axis wins.
    pub fn press_axis(&mut self, axis: MoveAxis, sign: i32) {
        *component(&mut self.axes, axis) = sign.signum();
    }

    /// Key-up: zero the axis only if it still holds this key's direction.
    pub fn release_axis(&mut self, axis: MoveAxis, sign: i32) {
        let value = component(&mut self.axes, axis);
        if *value == sign.signum() {
            *value = 0;
        }
    }

    /// Drop every held direction, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.axes = IVec3::ZERO;
    }

    pub fn add_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.pointer_delta += Vec2::new(dx, dy);
    }

    /// Return the accumulated pointer motion and reset it.
    pub fn take_pointer_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.pointer_delta)
    }

    /// Apply a key event. Returns the toggle to flip on a fresh key press.
    ///
    /// Repeat events are ignored entirely.
    pub fn process_key(&mut self, event: RawKeyEvent) -> Option<Toggle> {
        if event.repeat {
            return None;
        }
        match (action_for(event.key)?, event.state) {
            (KeyAction::Move { axis, sign }, ElementState::Pressed) => {
                self.press_axis(axis, sign);
                None
            }
            (KeyAction::Move { axis, sign }, ElementState::Released) => {
                self.release_axis(axis, sign);
                None
            }
            (KeyAction::Toggle(toggle), ElementState::Pressed) => {
                tracing::debug!(?toggle, "Scene toggle pressed");
                Some(toggle)
            }
            (KeyAction::Toggle(_), ElementState::Released) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::{KeyCode, PhysicalKey};

    fn raw(code: KeyCode, state: ElementState, repeat: bool) -> RawKeyEvent {
        RawKeyEvent {
            key: PhysicalKey::Code(code),
            state,
            repeat,
        }
    }

    fn press(input: &mut InputState, code: KeyCode) -> Option<Toggle> {
        input.process_key(raw(code, ElementState::Pressed, false))
    }

    fn release(input: &mut InputState, code: KeyCode) -> Option<Toggle> {
        input.process_key(raw(code, ElementState::Released, false))
    }

    #[test]
    fn test_initial_state_is_idle() {
        let mut input = InputState::new();
        assert_eq!(input.axes(), IVec3::ZERO);
        assert_eq!(input.take_pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_press_and_release_single_key() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        assert_eq!(input.axes(), IVec3::new(0, 0, -1));
        release(&mut input, KeyCode::KeyW);
        assert_eq!(input.axes(), IVec3::ZERO);
    }

    #[test]
    fn test_latest_press_wins() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::KeyS);
        assert_eq!(input.axes().z, 1);
    }

    #[test]
    fn test_release_of_overridden_key_keeps_axis() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::KeyS);
        release(&mut input, KeyCode::KeyW);
        assert_eq!(input.axes().z, 1);
        release(&mut input, KeyCode::KeyS);
        assert_eq!(input.axes().z, 0);
    }

    #[test]
    fn test_release_never_zeroes_mismatched_sign() {
        // Every press/release ordering of the two keys on one axis.
        let sequences: [[(KeyCode, ElementState); 4]; 3] = [
            [
                (KeyCode::KeyA, ElementState::Pressed),
                (KeyCode::KeyD, ElementState::Pressed),
                (KeyCode::KeyD, ElementState::Released),
                (KeyCode::KeyA, ElementState::Released),
            ],
            [
                (KeyCode::KeyD, ElementState::Pressed),
                (KeyCode::KeyA, ElementState::Pressed),
                (KeyCode::KeyD, ElementState::Released),
                (KeyCode::KeyA, ElementState::Released),
            ],
            [
                (KeyCode::KeyA, ElementState::Pressed),
                (KeyCode::KeyA, ElementState::Released),
                (KeyCode::KeyD, ElementState::Pressed),
                (KeyCode::KeyD, ElementState::Released),
            ],
        ];
        for sequence in sequences {
            let mut input = InputState::new();
            for (code, state) in sequence {
                let before = input.axes().x;
                input.process_key(raw(code, state, false));
                let after = input.axes().x;
                let sign = if code == KeyCode::KeyA { -1 } else { 1 };
                match state {
                    ElementState::Pressed => assert_eq!(after, sign),
                    ElementState::Released if before == sign => assert_eq!(after, 0),
                    ElementState::Released => assert_eq!(after, before),
                }
            }
        }
    }

    #[test]
    fn test_axes_are_independent() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyD);
        press(&mut input, KeyCode::KeyR);
        press(&mut input, KeyCode::KeyW);
        assert_eq!(input.axes(), IVec3::new(1, 1, -1));
        release(&mut input, KeyCode::KeyR);
        assert_eq!(input.axes(), IVec3::new(1, 0, -1));
    }

    #[test]
    fn test_toggle_fires_on_press_only() {
        let mut input = InputState::new();
        assert_eq!(press(&mut input, KeyCode::KeyN), Some(Toggle::NormalMapping));
        assert_eq!(release(&mut input, KeyCode::KeyN), None);
        assert_eq!(press(&mut input, KeyCode::KeyO), Some(Toggle::OrenNayar));
    }

    #[test]
    fn test_repeat_events_are_ignored() {
        let mut input = InputState::new();
        assert_eq!(
            input.process_key(raw(KeyCode::KeyN, ElementState::Pressed, true)),
            None
        );
        input.process_key(raw(KeyCode::KeyW, ElementState::Pressed, true));
        assert_eq!(input.axes(), IVec3::ZERO);
    }

    #[test]
    fn test_pointer_delta_accumulates_and_resets() {
        let mut input = InputState::new();
        input.add_pointer_delta(3.0, -1.0);
        input.add_pointer_delta(2.0, 4.0);
        assert_eq!(input.take_pointer_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.take_pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_release_all_clears_axes_only() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::KeyA);
        input.add_pointer_delta(1.0, 1.0);
        input.release_all();
        assert_eq!(input.axes(), IVec3::ZERO);
        assert_eq!(input.take_pointer_delta(), Vec2::ONE);
    }
}
