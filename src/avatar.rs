use crate::assets::{AssetCache, AssetFetcher, ModelScene, RequestState, ResourceDisposer};
use crate::config::{AvatarConfig, LightingHint};
use crate::emotion::EmotionState;
use crate::events::{AvatarEvent, EventBus};
use crate::playback::{LoopMode, OneShotBehavior, PlaybackController};
use crate::pointer::PointerOrientation;
use crate::registry::ClipIndex;
use crate::talking::TalkingLoop;
use glam::Vec2;
use std::sync::Arc;

/// One avatar instance: playback, talking loop, pointer smoothing, and the
/// asset cache, advanced together by `tick`. All scheduling is cooperative;
/// the embedding render loop supplies the tick.
pub struct Avatar {
    config: AvatarConfig,
    index: ClipIndex,
    controller: PlaybackController,
    talking: TalkingLoop,
    pointer: PointerOrientation,
    cache: AssetCache,
    events: EventBus,
    active_model: Option<Arc<ModelScene>>,
    pending_model: Option<String>,
}

impl Avatar {
    pub fn new(
        config: AvatarConfig,
        fetcher: Box<dyn AssetFetcher>,
        disposer: Box<dyn ResourceDisposer>,
    ) -> Self {
        let controller = PlaybackController::new(config.fade.clone());
        let talking = TalkingLoop::new(config.talking.clone());
        let pointer = PointerOrientation::new(config.pointer.clone());
        let cache = AssetCache::new(config.cache.clone(), config.model.clone(), fetcher, disposer);
        Self {
            config,
            index: ClipIndex::new(),
            controller,
            talking,
            pointer,
            cache,
            events: EventBus::new(),
            active_model: None,
            pending_model: None,
        }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn clip_index(&self) -> &ClipIndex {
        &self.index
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn active_model(&self) -> Option<&Arc<ModelScene>> {
        self.active_model.as_ref()
    }

    pub fn base_emotion(&self) -> EmotionState {
        self.controller.base_emotion()
    }

    pub fn is_talking(&self) -> bool {
        self.talking.is_active()
    }

    /// Swaps in a model: the clip index is rebuilt wholesale and the current
    /// base mood's clip restarts against the new clip set.
    pub fn set_model(&mut self, model: Arc<ModelScene>) {
        self.index = ClipIndex::build(&model.clips);
        self.controller.stop_all();
        let base = self.controller.base_emotion();
        self.controller.set_emotion(&self.index, base, &mut self.events);
        self.active_model = Some(model);
    }

    /// Requests a model by URL; it is adopted as the active model once the
    /// fetch lands. A TTL-valid cache hit adopts immediately.
    pub fn load_model(&mut self, url: &str) -> RequestState {
        let state = self.cache.request_model(url);
        match state {
            RequestState::Cached => {
                if let Some(model) = self.cache.model(url) {
                    self.pending_model = None;
                    self.set_model(model);
                }
            }
            _ => self.pending_model = Some(url.to_string()),
        }
        state
    }

    pub fn load_external_clip(&mut self, key: &str, url: &str) -> RequestState {
        self.cache.request_clip(key, url)
    }

    pub fn set_emotion(&mut self, state: EmotionState) {
        self.controller.set_emotion(&self.index, state, &mut self.events);
    }

    pub fn play_animation(&mut self, name: &str) {
        self.controller.play_animation(&self.index, name, &mut self.events);
    }

    /// Plays a loaded external clip once, or falls back to the given emotion
    /// when the key is not resident.
    pub fn play_external_animation(&mut self, key: &str, fallback: EmotionState) {
        match self.cache.clip(key) {
            Some(clip) => self.controller.play_clip(
                clip,
                LoopMode::Once,
                OneShotBehavior::RestoreBase,
                &mut self.events,
            ),
            None => {
                eprintln!("[avatar] external clip '{key}' not loaded; falling back to '{}'", fallback.label());
                self.set_emotion(fallback);
            }
        }
    }

    pub fn start_talking_loop(&mut self) {
        self.talking.start(&self.controller, &mut self.events);
    }

    pub fn stop_talking_loop(&mut self) {
        self.talking.stop(&self.index, &mut self.controller, &mut self.events);
    }

    pub fn update_pointer(&mut self, x: f32, y: f32) {
        self.pointer.update_pointer(x, y);
    }

    pub fn reset_pointer(&mut self) {
        self.pointer.reset_pointer();
    }

    pub fn head_orientation(&self) -> Vec2 {
        self.pointer.head_orientation()
    }

    pub fn lighting_hint(&self) -> LightingHint {
        self.config.lighting_hint(self.controller.base_emotion())
    }

    /// Advances every component by one frame and hands back whatever
    /// happened during it.
    pub fn tick(&mut self, dt: f32) -> Vec<AvatarEvent> {
        self.cache.pump(&mut self.events);
        self.cache.tick(dt, &mut self.events);
        if let Some(url) = self.pending_model.clone() {
            if let Some(model) = self.cache.model(&url) {
                self.pending_model = None;
                self.set_model(model);
            }
        }
        self.talking.tick(dt, &self.index, &self.cache, &mut self.controller, &mut self.events);
        self.controller.tick(&self.index, dt, &mut self.events);
        self.pointer.tick();
        self.events.drain()
    }

    /// Teardown: stops the talking session without a restore transition,
    /// drops all actions, cancels pending fetches, and disposes the caches.
    pub fn shutdown(&mut self) -> Vec<AvatarEvent> {
        self.talking.cancel();
        self.controller.stop_all();
        self.pending_model = None;
        self.active_model = None;
        self.cache.clear(&mut self.events);
        self.pointer.reset_pointer();
        self.events.drain()
    }
}
