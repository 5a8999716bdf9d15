use crate::clip::AnimationClip;
use crate::config::FadeConfig;
use crate::emotion::{is_gesture_clip, EmotionState};
use crate::events::{AvatarEvent, EventBus};
use crate::registry::ClipIndex;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopMode {
    Once,
    Repeat,
}

/// What happens when a one-shot action clamps at its final frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OneShotBehavior {
    /// After a short pause, fade back to the base emotion's clip.
    RestoreBase,
    /// Stay clamped; the caller observes the finish and decides.
    HoldAtEnd,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum ActionPhase {
    WaitingGap { remaining: f32 },
    FadingIn { elapsed: f32 },
    Playing,
    Finished,
}

/// A live playback instance bound to one clip.
pub struct PlaybackAction {
    pub clip: Arc<AnimationClip>,
    pub loop_mode: LoopMode,
    pub behavior: OneShotBehavior,
    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub generation: u64,
    phase: ActionPhase,
}

impl PlaybackAction {
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ActionPhase::Finished)
    }

    pub fn has_started(&self) -> bool {
        !matches!(self.phase, ActionPhase::WaitingGap { .. })
    }
}

struct FadingOut {
    action: PlaybackAction,
    elapsed: f32,
    start_weight: f32,
}

struct Completing {
    remaining: f32,
    generation: u64,
}

/// Drives clip playback with crossfade transitions. Exactly one action is
/// current at any time; a fading-out predecessor may coexist for the tail of
/// its fade. Any new play request supersedes a pending transition, so a
/// superseded completion can never restore an old state.
pub struct PlaybackController {
    cfg: FadeConfig,
    base_emotion: EmotionState,
    current: Option<PlaybackAction>,
    outgoing: Option<FadingOut>,
    completing: Option<Completing>,
    generation: u64,
}

impl PlaybackController {
    pub fn new(cfg: FadeConfig) -> Self {
        Self {
            cfg,
            base_emotion: EmotionState::Neutral,
            current: None,
            outgoing: None,
            completing: None,
            generation: 0,
        }
    }

    pub fn base_emotion(&self) -> EmotionState {
        self.base_emotion
    }

    pub fn current_action(&self) -> Option<&PlaybackAction> {
        self.current.as_ref()
    }

    pub fn outgoing_action(&self) -> Option<&PlaybackAction> {
        self.outgoing.as_ref().map(|fading| &fading.action)
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current_finished(&self) -> bool {
        self.current.as_ref().is_some_and(PlaybackAction::is_finished)
    }

    /// Resolves a clip by name and plays it. Gesture-bucket clips run once
    /// and clamp; everything else loops. A lookup miss leaves the current
    /// action untouched.
    pub fn play_animation(&mut self, index: &ClipIndex, name: &str, events: &mut EventBus) {
        let Some(clip) = index.lookup(name) else {
            eprintln!("[avatar] clip '{name}' not found; keeping current action");
            events.push(AvatarEvent::ClipMissing { name: name.to_string() });
            return;
        };
        let one_shot = is_gesture_clip(name) || is_gesture_clip(&clip.name);
        if one_shot {
            self.play_clip(clip, LoopMode::Once, OneShotBehavior::RestoreBase, events);
        } else {
            self.play_clip(clip, LoopMode::Repeat, OneShotBehavior::RestoreBase, events);
        }
    }

    /// Gestures play one-shot without touching the base mood; moods update
    /// the base mood and play its clip looping. Last write wins.
    pub fn set_emotion(&mut self, index: &ClipIndex, state: EmotionState, events: &mut EventBus) {
        if state.is_gesture() {
            match index.resolve_emotion(state) {
                Some(clip) => {
                    self.play_clip(clip, LoopMode::Once, OneShotBehavior::RestoreBase, events)
                }
                None => {
                    eprintln!("[avatar] no clip for gesture '{}'", state.label());
                    events.push(AvatarEvent::ClipMissing { name: state.clip_key().to_string() });
                }
            }
            return;
        }
        self.base_emotion = state;
        events.push(AvatarEvent::EmotionChanged { state });
        match index.resolve_emotion(state) {
            Some(clip) => self.play_clip(clip, LoopMode::Repeat, OneShotBehavior::RestoreBase, events),
            None => {
                // The avatar holds its last-good pose; the mood still changed.
                eprintln!("[avatar] no clip for emotion '{}'", state.label());
                events.push(AvatarEvent::ClipMissing { name: state.clip_key().to_string() });
            }
        }
    }

    pub fn play_clip(
        &mut self,
        clip: Arc<AnimationClip>,
        loop_mode: LoopMode,
        behavior: OneShotBehavior,
        events: &mut EventBus,
    ) {
        self.generation += 1;
        self.completing = None;
        if let Some(prev) = self.current.take() {
            if prev.weight > 0.0 {
                // At most one fading predecessor; a superseding play drops
                // the older one outright.
                self.outgoing =
                    Some(FadingOut { start_weight: prev.weight, action: prev, elapsed: 0.0 });
            }
        }
        let phase = if self.outgoing.is_some() {
            ActionPhase::WaitingGap { remaining: self.cfg.fade_duration + self.cfg.settle_gap }
        } else {
            ActionPhase::FadingIn { elapsed: 0.0 }
        };
        events.push(AvatarEvent::ClipStarted { name: Arc::clone(&clip.name), generation: self.generation });
        self.current = Some(PlaybackAction {
            clip,
            loop_mode,
            behavior,
            time: 0.0,
            time_scale: self.cfg.time_scale,
            weight: 0.0,
            generation: self.generation,
            phase,
        });
    }

    /// Drops current, outgoing, and any pending restore.
    pub fn stop_all(&mut self) {
        self.current = None;
        self.outgoing = None;
        self.completing = None;
    }

    pub fn tick(&mut self, index: &ClipIndex, dt: f32, events: &mut EventBus) {
        if dt <= 0.0 {
            return;
        }
        self.advance_outgoing(dt);
        self.advance_current(dt, events);
        self.advance_completing(index, dt, events);
    }

    fn advance_outgoing(&mut self, dt: f32) {
        let fade = self.cfg.fade_duration.max(f32::EPSILON);
        if let Some(fading) = self.outgoing.as_mut() {
            fading.elapsed += dt;
            let remaining = 1.0 - (fading.elapsed / fade).min(1.0);
            fading.action.weight = fading.start_weight * remaining;
            if fading.elapsed >= fade {
                self.outgoing = None;
            }
        }
    }

    fn advance_current(&mut self, dt: f32, events: &mut EventBus) {
        let fade = self.cfg.fade_duration.max(f32::EPSILON);
        let mut finished: Option<(Arc<str>, u64, OneShotBehavior)> = None;
        if let Some(action) = self.current.as_mut() {
            let mut dt = dt;
            if let ActionPhase::WaitingGap { remaining } = action.phase {
                if remaining > dt {
                    action.phase = ActionPhase::WaitingGap { remaining: remaining - dt };
                    return;
                }
                dt -= remaining;
                action.phase = ActionPhase::FadingIn { elapsed: 0.0 };
            }
            if let ActionPhase::FadingIn { elapsed } = action.phase {
                let elapsed = elapsed + dt;
                if elapsed >= fade {
                    action.weight = 1.0;
                    action.phase = ActionPhase::Playing;
                } else {
                    action.weight = elapsed / fade;
                    action.phase = ActionPhase::FadingIn { elapsed };
                }
            }
            if matches!(action.phase, ActionPhase::Finished) {
                return;
            }
            let duration = action.clip.duration;
            action.time += dt * action.time_scale;
            match action.loop_mode {
                LoopMode::Repeat => {
                    if duration > 0.0 {
                        action.time = action.time.rem_euclid(duration.max(f32::EPSILON));
                    }
                }
                LoopMode::Once => {
                    if action.time >= duration {
                        action.time = duration;
                        action.phase = ActionPhase::Finished;
                        finished =
                            Some((Arc::clone(&action.clip.name), action.generation, action.behavior));
                    }
                }
            }
        }
        if let Some((name, generation, behavior)) = finished {
            events.push(AvatarEvent::ClipFinished { name, generation });
            if behavior == OneShotBehavior::RestoreBase {
                self.completing =
                    Some(Completing { remaining: self.cfg.one_shot_return_pause, generation });
            }
        }
    }

    fn advance_completing(&mut self, index: &ClipIndex, dt: f32, events: &mut EventBus) {
        let Some(completing) = self.completing.as_mut() else {
            return;
        };
        completing.remaining -= dt;
        if completing.remaining > 0.0 {
            return;
        }
        let generation = completing.generation;
        self.completing = None;
        // A play() call clears the pending restore, so this only fires for
        // the one-shot the controller still tracks.
        if generation != self.generation {
            return;
        }
        // Whatever the base mood is *now* wins, even if it changed while the
        // one-shot was playing.
        match index.resolve_emotion(self.base_emotion) {
            Some(clip) => {
                self.play_clip(clip, LoopMode::Repeat, OneShotBehavior::RestoreBase, events)
            }
            None => {
                eprintln!(
                    "[avatar] no base clip for emotion '{}' after one-shot",
                    self.base_emotion.label()
                );
                events.push(AvatarEvent::ClipMissing {
                    name: self.base_emotion.clip_key().to_string(),
                });
            }
        }
    }
}
