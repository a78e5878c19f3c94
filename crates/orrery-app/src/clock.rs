//! Frame timing.
//!
//! The orrery animates directly from wall-clock time: each frame reads the
//! elapsed seconds since startup and the delta since the previous frame. The
//! clock never reports a negative delta; a step backwards is floored to zero.

use std::time::Instant;
use tracing::debug;

/// Elapsed time since startup and time since the previous frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    pub elapsed: f64,
    pub delta: f64,
}

/// Produces a [`FrameTiming`] once per frame.
pub struct FrameClock {
    start: Instant,
    last_elapsed: f64,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Starts the clock at the current instant.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Samples the wall clock and returns this frame's timing.
    pub fn tick(&mut self) -> FrameTiming {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.advance_to(elapsed)
    }

    /// Measure the next delta from now, discarding time spent since the last
    /// frame. Called once startup has finished.
    pub fn restart(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.restart_at(elapsed);
    }

    /// Measure the next delta from an explicit elapsed time.
    pub fn restart_at(&mut self, elapsed: f64) {
        self.last_elapsed = elapsed;
    }

    /// Advances to an explicit elapsed time.
    pub fn advance_to(&mut self, elapsed: f64) -> FrameTiming {
        let mut delta = elapsed - self.last_elapsed;
        if delta < 0.0 {
            debug!(
                "Clock stepped backwards by {:.3}ms, flooring delta to zero",
                -delta * 1000.0
            );
            delta = 0.0;
        }
        self.last_elapsed = elapsed;
        self.frame_count += 1;
        FrameTiming { elapsed, delta }
    }

    /// Number of frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_delta_is_elapsed() {
        let mut clock = FrameClock::new();
        let timing = clock.advance_to(0.5);
        assert_eq!(timing.elapsed, 0.5);
        assert!((timing.delta - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_delta_between_frames() {
        let mut clock = FrameClock::new();
        clock.advance_to(1.0);
        let timing = clock.advance_to(1.25);
        assert!((timing.delta - 0.25).abs() < 1e-12);
        assert_eq!(timing.elapsed, 1.25);
    }

    #[test]
    fn test_repeated_time_gives_zero_delta() {
        let mut clock = FrameClock::new();
        clock.advance_to(2.0);
        let timing = clock.advance_to(2.0);
        assert_eq!(timing.delta, 0.0);
    }

    #[test]
    fn test_negative_step_floors_to_zero() {
        let mut clock = FrameClock::new();
        clock.advance_to(5.0);
        let timing = clock.advance_to(4.0);
        assert_eq!(timing.delta, 0.0);
        assert_eq!(timing.elapsed, 4.0);

        // The next frame measures from the stepped-back time.
        let timing = clock.advance_to(4.5);
        assert!((timing.delta - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_restart_discards_elapsed_gap() {
        let mut clock = FrameClock::new();
        clock.restart_at(1.5);
        let timing = clock.advance_to(1.5);
        assert_eq!(timing.delta, 0.0);
        assert_eq!(timing.elapsed, 1.5);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_tick_after_restart_excludes_pause() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(200));
        clock.restart();
        let timing = clock.tick();
        assert!(timing.elapsed >= 0.2);
        assert!(timing.delta < 0.2, "delta {} spans the pause", timing.delta);
    }

    #[test]
    fn test_frame_count() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame_count(), 0);
        for i in 1..=10 {
            clock.advance_to(i as f64 * 0.016);
        }
        assert_eq!(clock.frame_count(), 10);
    }

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(second.elapsed >= first.elapsed);
        assert!(second.delta >= 0.0);
    }
}
