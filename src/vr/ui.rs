//! Headset UI manager: keeps the panel in front of the camera, maps
//! controller buttons and panel controls to actions, and wires the catalog
//! to the player.
//!
//! The host calls [`VrUiManager::init`] once, [`VrUiManager::tick`] every
//! frame, and [`VrUiManager::shutdown`] on teardown, which drops every
//! registered control binding.

use super::{
    Vec3,
    catalog::{RefreshOutcome, VideoSource, VrCatalog},
    player::{VrPlayer, VrRenderer},
};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

pub const UI_DISTANCE: f32 = 2.0;
pub const UI_HEIGHT: f32 = 1.6;

/// Controller buttons, named as on the headset controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// A or X.
    One,
    /// B or Y.
    Two,
}

/// A clickable control on the panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Control {
    RefreshButton,
    PassthroughToggle,
    VideoItem(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    RefreshCatalog,
    TogglePassthrough,
    PlayVideo(String),
}

/// Registered click handlers. Everything registered is removed on shutdown.
#[derive(Debug, Default)]
pub struct ControlBindings {
    handlers: HashMap<Control, UiAction>,
}

impl ControlBindings {
    pub fn register(&mut self, control: Control, action: UiAction) {
        self.handlers.insert(control, action);
    }

    pub fn deregister(&mut self, control: &Control) -> Option<UiAction> {
        self.handlers.remove(control)
    }

    /// Drop every video item binding, keeping the fixed controls.
    pub fn clear_items(&mut self) {
        self.handlers
            .retain(|control, _| !matches!(control, Control::VideoItem(_)));
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn action_for(&self, control: &Control) -> Option<&UiAction> {
        self.handlers.get(control)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Panel placement: where it sits and the direction it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiPose {
    pub position: Vec3,
    pub facing: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiSettings {
    pub distance: f32,
    pub height: f32,
    pub follow_camera: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            distance: UI_DISTANCE,
            height: UI_HEIGHT,
            follow_camera: true,
        }
    }
}

/// `distance` ahead of the camera, `height` above it, facing away from it.
pub fn position_ui(camera: &CameraPose, settings: &UiSettings) -> UiPose {
    let mut position = camera.position + camera.forward * settings.distance;
    position.y = camera.position.y + settings.height;
    UiPose {
        position,
        facing: (position - camera.position).normalized(),
    }
}

pub struct VrUiManager<S, R> {
    catalog: Arc<VrCatalog<S>>,
    player: VrPlayer<R>,
    bindings: ControlBindings,
    settings: UiSettings,
    pose: Option<UiPose>,
}

impl<S: VideoSource, R: VrRenderer> VrUiManager<S, R> {
    pub fn new(catalog: Arc<VrCatalog<S>>, player: VrPlayer<R>, settings: UiSettings) -> Self {
        Self {
            catalog,
            player,
            bindings: ControlBindings::default(),
            settings,
            pose: None,
        }
    }

    pub fn catalog(&self) -> &Arc<VrCatalog<S>> {
        &self.catalog
    }

    pub fn player(&self) -> &VrPlayer<R> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut VrPlayer<R> {
        &mut self.player
    }

    pub fn bindings(&self) -> &ControlBindings {
        &self.bindings
    }

    pub fn pose(&self) -> Option<UiPose> {
        self.pose
    }

    /// Wire the fixed controls, place the panel, and load the catalog.
    pub async fn init(&mut self, camera: Option<&CameraPose>) -> RefreshOutcome {
        self.player.init();
        self.bindings
            .register(Control::RefreshButton, UiAction::RefreshCatalog);
        self.bindings
            .register(Control::PassthroughToggle, UiAction::TogglePassthrough);
        self.reposition(camera);
        self.refresh().await
    }

    /// One host frame: follow the camera, then handle buttons pressed this
    /// frame.
    pub async fn tick(&mut self, camera: Option<&CameraPose>, pressed: &[Button]) {
        if self.settings.follow_camera {
            self.reposition(camera);
        }
        for button in pressed {
            let action = match button {
                Button::Two => UiAction::RefreshCatalog,
                Button::One => UiAction::TogglePassthrough,
            };
            self.perform(action).await;
        }
    }

    /// A panel control was clicked.
    pub async fn click(&mut self, control: &Control) {
        match self.bindings.action_for(control).cloned() {
            Some(action) => self.perform(action).await,
            None => debug!(?control, "click on unbound control"),
        }
    }

    pub fn shutdown(&mut self) {
        self.bindings.clear();
        self.player.shutdown();
    }

    async fn perform(&mut self, action: UiAction) {
        match action {
            UiAction::RefreshCatalog => {
                self.refresh().await;
            }
            UiAction::TogglePassthrough => {
                self.player.toggle_passthrough();
            }
            UiAction::PlayVideo(key) => self.play(&key).await,
        }
    }

    async fn refresh(&mut self) -> RefreshOutcome {
        let outcome = self.catalog.refresh().await;
        match outcome {
            RefreshOutcome::Loaded(_) => {
                self.bindings.clear_items();
                for item in self.catalog.items().await {
                    self.bindings.register(
                        Control::VideoItem(item.key.clone()),
                        UiAction::PlayVideo(item.key),
                    );
                }
            }
            // the catalog has already dropped its items
            RefreshOutcome::Failed(_) => self.bindings.clear_items(),
            RefreshOutcome::Skipped => {}
        }
        outcome
    }

    async fn play(&mut self, key: &str) {
        match self.catalog.select(key).await {
            Ok(selection) if selection.url.is_empty() => {
                self.catalog
                    .set_status("Error: Could not get video URL")
                    .await;
            }
            Ok(selection) => {
                self.player.play_video(&selection.url, selection.video_type);
                self.catalog
                    .set_status(format!("Playing: {}", selection.title))
                    .await;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to play video");
                self.catalog
                    .set_status(format!("Error playing video: {}", e))
                    .await;
            }
        }
    }

    fn reposition(&mut self, camera: Option<&CameraPose>) {
        if let Some(camera) = camera {
            self.pose = Some(position_ui(camera, &self.settings));
        }
    }
}
