//! Browser player state: the controllable media surface and its control
//! overlay. Both are driven by the host (a page, a test) through explicit
//! calls; neither owns a clock or an event loop.

pub mod controls;
pub mod surface;

pub use controls::ControlsOverlay;
pub use surface::{FullscreenHost, MediaElement, PlaybackSurface};
