//! Cursor capture for free-look.

use tracing::{info, warn};
use winit::window::{CursorGrabMode, Window};

/// Tracks whether the cursor is grabbed and hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerCapture {
    captured: bool,
}

impl PointerCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grab and hide the cursor so relative motion drives the camera.
    ///
    /// Locked mode is tried first; platforms without it fall back to confined.
    pub fn capture(&mut self, window: &Window) {
        if window.set_cursor_grab(CursorGrabMode::Locked).is_err()
            && let Err(err) = window.set_cursor_grab(CursorGrabMode::Confined)
        {
            warn!("Cursor grab unavailable: {err}");
        }
        window.set_cursor_visible(false);
        self.captured = true;
        info!("Cursor captured");
    }

    /// Release the grab and show the cursor again.
    pub fn release(&mut self, window: &Window) {
        let _ = window.set_cursor_grab(CursorGrabMode::None);
        window.set_cursor_visible(true);
        self.captured = false;
    }

    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }
}
