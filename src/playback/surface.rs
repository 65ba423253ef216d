//! A controllable media element: play/pause, seek, skip, volume, mute,
//! fullscreen.
//!
//! The surface mirrors the element's position and duration from the
//! element's own events (`on_time_update`, `on_loaded_metadata`) and drives
//! it by setting position and volume directly.

use crate::format::format_time;
use tracing::debug;

/// Seconds moved by one skip.
pub const SKIP_SECONDS: f64 = 10.0;

/// The native element the surface drives.
pub trait MediaElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
}

/// The document owning fullscreen. At most one element is fullscreen.
pub trait FullscreenHost {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
}

#[derive(Debug)]
pub struct PlaybackSurface<M> {
    element: M,
    playing: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
}

impl<M: MediaElement> PlaybackSurface<M> {
    pub fn new(element: M) -> Self {
        Self {
            element,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
        }
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_play(&mut self) {
        if self.playing {
            self.element.pause();
        } else {
            self.element.play();
        }
        self.playing = !self.playing;
        debug!(playing = self.playing, "toggled playback");
    }

    /// Absolute seek from the position slider, clamped to `[0, duration]`.
    pub fn seek(&mut self, seconds: f64) {
        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, self.duration.max(0.0))
        };
        self.element.set_current_time(target);
        self.current_time = target;
    }

    /// Relative skip. Not clamped here; the element bounds the position.
    pub fn skip_forward(&mut self) {
        self.skip_by(SKIP_SECONDS);
    }

    pub fn skip_backward(&mut self) {
        self.skip_by(-SKIP_SECONDS);
    }

    fn skip_by(&mut self, delta: f64) {
        let target = self.element.current_time() + delta;
        self.element.set_current_time(target);
    }

    /// Volume slider, clamped to `[0, 1]`. Zero means muted.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.element.set_volume(volume);
        self.volume = volume;
        self.muted = volume == 0.0;
    }

    /// Muting drops volume to 0. Unmuting always restores full volume, not
    /// the level before muting.
    pub fn toggle_mute(&mut self) {
        let muted = !self.muted;
        self.element.set_muted(muted);
        self.muted = muted;
        self.volume = if muted { 0.0 } else { 1.0 };
        self.element.set_volume(self.volume);
        debug!(muted, "toggled mute");
    }

    /// Leave fullscreen if anything holds it, otherwise request it.
    pub fn toggle_fullscreen<H: FullscreenHost>(&self, host: &mut H) {
        if host.is_fullscreen() {
            host.exit_fullscreen();
        } else {
            host.request_fullscreen();
        }
    }

    pub fn on_time_update(&mut self) {
        self.current_time = self.element.current_time();
    }

    pub fn on_loaded_metadata(&mut self) {
        let duration = self.element.duration();
        self.duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
    }

    /// `current / duration`, e.g. `1:05 / 12:00`.
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time),
            format_time(self.duration)
        )
    }
}
