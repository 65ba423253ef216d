//! Control overlay visibility.
//!
//! Pointer movement shows the overlay and restarts a 3 second idle timer.
//! When the timer lapses the overlay hides, but only while playing.

use std::time::{Duration, Instant};

pub const CONTROLS_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ControlsOverlay {
    visible: bool,
    hide_at: Option<Instant>,
    timeout: Duration,
}

impl Default for ControlsOverlay {
    fn default() -> Self {
        Self::new(CONTROLS_IDLE_TIMEOUT)
    }
}

impl ControlsOverlay {
    pub fn new(timeout: Duration) -> Self {
        Self {
            visible: true,
            hide_at: None,
            timeout,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + self.timeout);
    }

    pub fn pointer_left(&mut self, playing: bool) {
        if playing {
            self.visible = false;
        }
    }

    /// Advance the idle timer. Returns the visibility after the tick.
    pub fn tick(&mut self, now: Instant, playing: bool) -> bool {
        if let Some(deadline) = self.hide_at {
            if now >= deadline {
                self.hide_at = None;
                if playing {
                    self.visible = false;
                }
            }
        }
        self.visible
    }
}
