use crate::assets::AssetCache;
use crate::clip::AnimationClip;
use crate::config::TalkingConfig;
use crate::emotion::EmotionState;
use crate::events::{AvatarEvent, EventBus};
use crate::playback::{LoopMode, OneShotBehavior, PlaybackController};
use crate::registry::ClipIndex;
use std::sync::Arc;

enum TalkPhase {
    Inactive,
    /// Pick the next variant on the coming tick.
    Cue,
    /// Actions cleared; waiting before the variant starts.
    Settle { remaining: f32, clip: Arc<AnimationClip> },
    /// Variant playing once, clamped at end when done.
    Playing { generation: u64 },
    /// Inter-utterance gap before the rotation advances.
    Gap { remaining: f32 },
    /// Variant missing from both sources; generic filler is looping.
    Retry { remaining: f32 },
}

/// Cycles talk-clip variants while speech output runs. Session state exists
/// only while active; stopping restores the mood that was current at start.
pub struct TalkingLoop {
    cfg: TalkingConfig,
    phase: TalkPhase,
    rotation: usize,
    restore: EmotionState,
}

impl TalkingLoop {
    pub fn new(cfg: TalkingConfig) -> Self {
        Self { cfg, phase: TalkPhase::Inactive, rotation: 0, restore: EmotionState::Neutral }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, TalkPhase::Inactive)
    }

    pub fn rotation_index(&self) -> usize {
        self.rotation
    }

    /// No-op when already active.
    pub fn start(&mut self, controller: &PlaybackController, events: &mut EventBus) {
        if self.is_active() {
            return;
        }
        if self.cfg.variants.is_empty() {
            eprintln!("[talk] no talk variants configured; loop not started");
            return;
        }
        self.restore = controller.base_emotion();
        self.rotation = 0;
        self.phase = TalkPhase::Cue;
        events.push(AvatarEvent::TalkingStarted);
    }

    /// No-op when inactive. Restores the prior mood synchronously instead of
    /// waiting on any in-flight variant.
    pub fn stop(
        &mut self,
        index: &ClipIndex,
        controller: &mut PlaybackController,
        events: &mut EventBus,
    ) {
        if !self.is_active() {
            return;
        }
        self.phase = TalkPhase::Inactive;
        let restored = self.restore;
        controller.set_emotion(index, restored, events);
        events.push(AvatarEvent::TalkingStopped { restored });
    }

    /// Drops the session without touching playback. Teardown path.
    pub fn cancel(&mut self) {
        self.phase = TalkPhase::Inactive;
    }

    pub fn tick(
        &mut self,
        dt: f32,
        index: &ClipIndex,
        cache: &AssetCache,
        controller: &mut PlaybackController,
        events: &mut EventBus,
    ) {
        let phase = std::mem::replace(&mut self.phase, TalkPhase::Inactive);
        self.phase = match phase {
            TalkPhase::Inactive => TalkPhase::Inactive,
            TalkPhase::Cue => self.cue_next_variant(index, cache, controller, events),
            TalkPhase::Settle { remaining, clip } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    controller.play_clip(clip, LoopMode::Once, OneShotBehavior::HoldAtEnd, events);
                    TalkPhase::Playing { generation: controller.current_generation() }
                } else {
                    TalkPhase::Settle { remaining, clip }
                }
            }
            TalkPhase::Playing { generation } => {
                let superseded = controller
                    .current_action()
                    .map_or(true, |action| action.generation != generation);
                if superseded || controller.is_current_finished() {
                    TalkPhase::Gap { remaining: self.cfg.gap }
                } else {
                    TalkPhase::Playing { generation }
                }
            }
            TalkPhase::Gap { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.advance_rotation();
                    TalkPhase::Cue
                } else {
                    TalkPhase::Gap { remaining }
                }
            }
            TalkPhase::Retry { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.advance_rotation();
                    TalkPhase::Cue
                } else {
                    TalkPhase::Retry { remaining }
                }
            }
        };
    }

    fn advance_rotation(&mut self) {
        self.rotation = (self.rotation + 1) % self.cfg.variants.len().max(1);
    }

    fn cue_next_variant(
        &mut self,
        index: &ClipIndex,
        cache: &AssetCache,
        controller: &mut PlaybackController,
        events: &mut EventBus,
    ) -> TalkPhase {
        let variant = &self.cfg.variants[self.rotation % self.cfg.variants.len()];
        let found = index.lookup(variant).or_else(|| cache.clip(variant));
        if let Some(clip) = found {
            controller.stop_all();
            return TalkPhase::Settle { remaining: self.cfg.settle, clip };
        }
        eprintln!("[talk] variant '{variant}' unavailable; falling back to generic talking clip");
        events.push(AvatarEvent::ClipMissing { name: variant.clone() });
        let fallback =
            index.lookup(&self.cfg.fallback_key).or_else(|| cache.clip(&self.cfg.fallback_key));
        if let Some(clip) = fallback {
            controller.play_clip(clip, LoopMode::Repeat, OneShotBehavior::RestoreBase, events);
        }
        TalkPhase::Retry { remaining: self.cfg.retry_delay }
    }
}
