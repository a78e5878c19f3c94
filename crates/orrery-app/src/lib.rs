//! Orrery application: the frame clock and the winit event loop that drives
//! the camera and the scene renderer.

pub mod app;
pub mod clock;

pub use app::{AppError, OrreryApp, run, window_attributes_from_config};
pub use clock::{FrameClock, FrameTiming};
