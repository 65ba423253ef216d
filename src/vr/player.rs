//! Headset player: Stopped -> Preparing -> Playing, with the display set up
//! per [`VideoType`] and a passthrough blend toggle.

use super::{Vec3, video_type::VideoType};
use tracing::{debug, error, info};

/// Where a flat or side-by-side screen is spawned, relative to the scene root.
pub const SCREEN_POSITION: Vec3 = Vec3::new(0.0, 1.6, 2.0);
pub const SCREEN_TEXTURE_PROPERTY: &str = "_MainTex";
pub const SIDE_BY_SIDE_KEYWORD: &str = "_STEREO_SIDE_BY_SIDE";
pub const TOP_BOTTOM_KEYWORD: &str = "_STEREO_TOP_BOTTOM";
pub const PASSTHROUGH_OPACITY: f32 = 0.7;
pub const OPAQUE: f32 = 1.0;

/// Equirectangular render target for sphere playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTextureSpec {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

pub const SKYBOX_TEXTURE: RenderTextureSpec = RenderTextureSpec {
    width: 4096,
    height: 2048,
    depth: 24,
};

/// How a video type is put in front of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySetup {
    Screen {
        stereo_keyword: Option<&'static str>,
    },
    Skybox {
        texture: RenderTextureSpec,
        stereo_keyword: Option<&'static str>,
    },
}

impl DisplaySetup {
    pub fn for_type(video_type: VideoType) -> Self {
        match video_type {
            VideoType::Flat => DisplaySetup::Screen {
                stereo_keyword: None,
            },
            VideoType::SideBySide3D => DisplaySetup::Screen {
                stereo_keyword: Some(SIDE_BY_SIDE_KEYWORD),
            },
            VideoType::Spherical360 => DisplaySetup::Skybox {
                texture: SKYBOX_TEXTURE,
                stereo_keyword: None,
            },
            VideoType::Spherical360Stereo => DisplaySetup::Skybox {
                texture: SKYBOX_TEXTURE,
                stereo_keyword: Some(TOP_BOTTOM_KEYWORD),
            },
        }
    }
}

/// The engine side: video decoding, materials, skybox, passthrough layer.
pub trait VrRenderer {
    fn set_source(&mut self, url: &str);
    fn prepare(&mut self);
    fn play(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;

    fn spawn_screen(&mut self, position: Vec3);
    fn bind_screen(&mut self, texture_property: &str);
    fn enable_screen_keyword(&mut self, keyword: &str);
    fn set_screen_opacity(&mut self, opacity: f32);

    fn bind_skybox(&mut self, texture: RenderTextureSpec);
    fn enable_skybox_keyword(&mut self, keyword: &str);
    fn clear_skybox(&mut self);

    /// `None` when the headset has no passthrough layer.
    fn passthrough_layer(&mut self) -> Option<&mut dyn PassthroughLayer>;
}

pub trait PassthroughLayer {
    fn set_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Stopped,
    Preparing,
    Playing,
}

pub struct VrPlayer<R> {
    renderer: R,
    phase: PlaybackPhase,
    current_type: VideoType,
    current_url: Option<String>,
    screen_spawned: bool,
    passthrough_active: bool,
    last_error: Option<String>,
}

impl<R: VrRenderer> VrPlayer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            phase: PlaybackPhase::Stopped,
            current_type: VideoType::Flat,
            current_url: None,
            screen_spawned: false,
            passthrough_active: false,
            last_error: None,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn current_type(&self) -> VideoType {
        self.current_type
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn passthrough_active(&self) -> bool {
        self.passthrough_active
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start with passthrough off.
    pub fn init(&mut self) {
        if let Some(layer) = self.renderer.passthrough_layer() {
            layer.set_enabled(false);
        }
        self.passthrough_active = false;
    }

    pub fn play_video(&mut self, url: &str, video_type: VideoType) {
        self.stop_current();
        self.current_type = video_type;
        self.current_url = Some(url.to_string());
        self.last_error = None;

        self.renderer.set_source(url);
        self.setup_display(DisplaySetup::for_type(video_type));
        self.renderer.prepare();
        self.phase = PlaybackPhase::Preparing;
        info!(url = %url, video_type = %video_type, "preparing video");
    }

    fn setup_display(&mut self, setup: DisplaySetup) {
        match setup {
            DisplaySetup::Screen { stereo_keyword } => {
                if !self.screen_spawned {
                    self.renderer.spawn_screen(SCREEN_POSITION);
                    self.screen_spawned = true;
                }
                self.renderer.bind_screen(SCREEN_TEXTURE_PROPERTY);
                if let Some(keyword) = stereo_keyword {
                    self.renderer.enable_screen_keyword(keyword);
                }
            }
            DisplaySetup::Skybox {
                texture,
                stereo_keyword,
            } => {
                self.renderer.bind_skybox(texture);
                if let Some(keyword) = stereo_keyword {
                    self.renderer.enable_skybox_keyword(keyword);
                }
            }
        }
    }

    /// The engine finished preparing. Ignored unless a video is pending.
    pub fn on_prepare_completed(&mut self) {
        if self.phase != PlaybackPhase::Preparing {
            return;
        }
        self.renderer.play();
        self.phase = PlaybackPhase::Playing;
        debug!("playback started");
    }

    pub fn on_error(&mut self, message: &str) {
        error!(error = %message, "video player error");
        self.last_error = Some(message.to_string());
        self.phase = PlaybackPhase::Stopped;
    }

    pub fn stop_current(&mut self) {
        if self.renderer.is_playing() {
            self.renderer.stop();
        }
        if self.current_type.is_spherical() {
            self.renderer.clear_skybox();
        }
        self.phase = PlaybackPhase::Stopped;
    }

    /// Flip passthrough. No-op without a passthrough layer. The screen, when
    /// present, blends at 0.7 opacity while passthrough is on.
    pub fn toggle_passthrough(&mut self) -> bool {
        let active = !self.passthrough_active;
        let Some(layer) = self.renderer.passthrough_layer() else {
            return self.passthrough_active;
        };
        layer.set_enabled(active);
        self.passthrough_active = active;

        if self.screen_spawned {
            let opacity = if active { PASSTHROUGH_OPACITY } else { OPAQUE };
            self.renderer.set_screen_opacity(opacity);
        }
        debug!(passthrough = active, "toggled passthrough");
        active
    }

    pub fn shutdown(&mut self) {
        self.stop_current();
        self.current_url = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct FakeLayer {
        pub enabled: bool,
    }

    impl PassthroughLayer for FakeLayer {
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeRenderer {
        pub source: Option<String>,
        pub prepared: bool,
        pub playing: bool,
        pub screens_spawned: usize,
        pub screen_position: Option<Vec3>,
        pub screen_bound: Option<String>,
        pub screen_keywords: Vec<String>,
        pub screen_opacity: Option<f32>,
        pub skybox: Option<RenderTextureSpec>,
        pub skybox_keywords: Vec<String>,
        pub passthrough: Option<FakeLayer>,
    }

    impl FakeRenderer {
        pub(crate) fn with_passthrough() -> Self {
            Self {
                passthrough: Some(FakeLayer { enabled: true }),
                ..Default::default()
            }
        }
    }

    impl VrRenderer for FakeRenderer {
        fn set_source(&mut self, url: &str) {
            self.source = Some(url.to_string());
        }
        fn prepare(&mut self) {
            self.prepared = true;
        }
        fn play(&mut self) {
            self.playing = true;
        }
        fn stop(&mut self) {
            self.playing = false;
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn spawn_screen(&mut self, position: Vec3) {
            self.screens_spawned += 1;
            self.screen_position = Some(position);
        }
        fn bind_screen(&mut self, texture_property: &str) {
            self.screen_bound = Some(texture_property.to_string());
        }
        fn enable_screen_keyword(&mut self, keyword: &str) {
            self.screen_keywords.push(keyword.to_string());
        }
        fn set_screen_opacity(&mut self, opacity: f32) {
            self.screen_opacity = Some(opacity);
        }
        fn bind_skybox(&mut self, texture: RenderTextureSpec) {
            self.skybox = Some(texture);
        }
        fn enable_skybox_keyword(&mut self, keyword: &str) {
            self.skybox_keywords.push(keyword.to_string());
        }
        fn clear_skybox(&mut self) {
            self.skybox = None;
        }
        fn passthrough_layer(&mut self) -> Option<&mut dyn PassthroughLayer> {
            self.passthrough
                .as_mut()
                .map(|layer| layer as &mut dyn PassthroughLayer)
        }
    }

    #[test]
    fn flat_video_prepares_then_plays_on_screen() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        player.play_video("https://cdn/v.mp4", VideoType::Flat);
        assert_eq!(player.phase(), PlaybackPhase::Preparing);
        assert!(!player.renderer().playing);

        player.on_prepare_completed();
        assert_eq!(player.phase(), PlaybackPhase::Playing);

        let r = player.renderer();
        assert!(r.playing);
        assert_eq!(r.source.as_deref(), Some("https://cdn/v.mp4"));
        assert_eq!(r.screen_position, Some(SCREEN_POSITION));
        assert_eq!(r.screen_bound.as_deref(), Some(SCREEN_TEXTURE_PROPERTY));
        assert!(r.screen_keywords.is_empty());
    }

    #[test]
    fn screen_is_spawned_once() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        player.play_video("a", VideoType::Flat);
        player.play_video("b", VideoType::SideBySide3D);
        assert_eq!(player.renderer().screens_spawned, 1);
        assert_eq!(player.renderer().screen_keywords, vec![SIDE_BY_SIDE_KEYWORD]);
    }

    #[test]
    fn stereo_sphere_uses_skybox_with_top_bottom() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        player.play_video("a", VideoType::Spherical360Stereo);
        let r = player.renderer();
        assert_eq!(r.skybox, Some(SKYBOX_TEXTURE));
        assert_eq!(r.skybox_keywords, vec![TOP_BOTTOM_KEYWORD]);
        assert_eq!(r.screens_spawned, 0);
    }

    #[test]
    fn switching_away_from_sphere_clears_skybox() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        player.play_video("a", VideoType::Spherical360);
        player.on_prepare_completed();
        player.play_video("b", VideoType::Flat);
        assert!(player.renderer().skybox.is_none());
        assert_eq!(player.current_type(), VideoType::Flat);
    }

    #[test]
    fn passthrough_blends_screen() {
        let mut player = VrPlayer::new(FakeRenderer::with_passthrough());
        player.init();
        assert!(!player.passthrough_active());

        assert!(player.toggle_passthrough());
        assert_eq!(player.renderer().screen_opacity, None);

        player.play_video("a", VideoType::Flat);
        assert!(!player.toggle_passthrough());
        assert_eq!(player.renderer().screen_opacity, Some(OPAQUE));
        assert!(player.toggle_passthrough());
        assert_eq!(player.renderer().screen_opacity, Some(PASSTHROUGH_OPACITY));
        assert!(player.renderer().passthrough.as_ref().is_some_and(|l| l.enabled));
    }

    #[test]
    fn passthrough_needs_a_layer() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        assert!(!player.toggle_passthrough());
        assert!(!player.passthrough_active());
    }

    #[test]
    fn error_stops_and_late_prepare_is_ignored() {
        let mut player = VrPlayer::new(FakeRenderer::default());
        player.play_video("a", VideoType::Flat);
        player.on_error("codec not supported");
        assert_eq!(player.phase(), PlaybackPhase::Stopped);
        assert_eq!(player.last_error(), Some("codec not supported"));

        player.on_prepare_completed();
        assert_eq!(player.phase(), PlaybackPhase::Stopped);
        assert!(!player.renderer().playing);
    }
}
