use avatar_engine::clip::{AnimationClip, KeyframeTrack, TrackProperty, TrackValues};
use avatar_engine::config::FadeConfig;
use avatar_engine::emotion::EmotionState;
use avatar_engine::events::{AvatarEvent, EventBus};
use avatar_engine::playback::{LoopMode, PlaybackController};
use avatar_engine::registry::ClipIndex;
use glam::Quat;
use std::sync::Arc;

fn clip(name: &str, duration: f32) -> Arc<AnimationClip> {
    let track = KeyframeTrack::new(
        "mixamorigHead",
        TrackProperty::Rotation,
        vec![0.0, duration],
        TrackValues::Quat(Arc::from(vec![Quat::IDENTITY, Quat::IDENTITY])),
    )
    .expect("test track");
    Arc::new(AnimationClip::from_tracks(name, vec![track]).expect("test clip"))
}

fn index_of(clips: &[(&str, f32)]) -> ClipIndex {
    let clips: Vec<Arc<AnimationClip>> =
        clips.iter().map(|&(name, duration)| clip(name, duration)).collect();
    ClipIndex::build(&clips)
}

fn drive(controller: &mut PlaybackController, index: &ClipIndex, events: &mut EventBus, seconds: f32) {
    let mut remaining = seconds;
    while remaining > 1e-6 {
        let dt = remaining.min(0.05);
        controller.tick(index, dt, events);
        remaining -= dt;
    }
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn crossfade_gap_then_fade_in() {
    let index = index_of(&[("Idle", 1.0), ("Wave", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 1.0);
    let current = controller.current_action().expect("idle action");
    assert!(approx(current.weight, 1.0), "idle should be fully faded in");

    controller.set_emotion(&index, EmotionState::Happy, &mut events);
    let current = controller.current_action().expect("wave action");
    assert_eq!(current.clip.name.as_ref(), "Wave");
    assert!(!current.has_started(), "new action waits out the gap");
    let outgoing = controller.outgoing_action().expect("idle fading out");
    assert_eq!(outgoing.clip.name.as_ref(), "Idle");

    // Half the fade: outgoing at half weight, incoming still waiting.
    controller.tick(&index, 0.2, &mut events);
    let outgoing = controller.outgoing_action().expect("idle still fading");
    assert!(approx(outgoing.weight, 0.5), "outgoing weight was {}", outgoing.weight);
    assert!(approx(controller.current_action().expect("wave").weight, 0.0));

    // Fade completes; the gap has 0.15s left.
    controller.tick(&index, 0.2, &mut events);
    assert!(controller.outgoing_action().is_none(), "outgoing lingered past its fade");
    assert!(!controller.current_action().expect("wave").has_started());

    // Crosses the gap boundary and starts fading in with the remainder.
    controller.tick(&index, 0.2, &mut events);
    let current = controller.current_action().expect("wave");
    assert!(current.has_started());
    assert!(approx(current.weight, 0.05 / 0.4), "fade-in weight was {}", current.weight);

    drive(&mut controller, &index, &mut events, 0.4);
    assert!(approx(controller.current_action().expect("wave").weight, 1.0));
}

#[test]
fn one_shot_gesture_restores_current_base_mood() {
    let index = index_of(&[("Idle", 1.0), ("Wave", 1.0), ("Hi", 0.5)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    controller.set_emotion(&index, EmotionState::Happy, &mut events);
    drive(&mut controller, &index, &mut events, 1.5);
    assert_eq!(controller.base_emotion(), EmotionState::Happy);

    controller.play_animation(&index, "hi", &mut events);
    assert_eq!(controller.base_emotion(), EmotionState::Happy, "gesture must not change the mood");
    let current = controller.current_action().expect("hi action");
    assert_eq!(current.clip.name.as_ref(), "Hi");
    assert_eq!(current.loop_mode, LoopMode::Once);

    events.drain();
    drive(&mut controller, &index, &mut events, 3.0);
    let drained = events.drain();
    assert!(
        drained.iter().any(|event| matches!(event, AvatarEvent::ClipFinished { name, .. } if name.as_ref() == "Hi")),
        "gesture never reported finishing"
    );
    let current = controller.current_action().expect("restored action");
    assert_eq!(current.clip.name.as_ref(), "Wave", "should return to the Happy base clip");
    assert_eq!(current.loop_mode, LoopMode::Repeat);
}

#[test]
fn mood_change_during_gesture_wins() {
    let index = index_of(&[("Idle", 1.0), ("Hi", 0.5), ("Sad", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    controller.play_animation(&index, "hi", &mut events);
    drive(&mut controller, &index, &mut events, 0.3);

    controller.set_emotion(&index, EmotionState::Sad, &mut events);
    events.drain();
    drive(&mut controller, &index, &mut events, 3.0);
    let drained = events.drain();
    assert!(
        !drained.iter().any(|event| matches!(event, AvatarEvent::ClipStarted { name, .. } if name.as_ref() == "Idle")),
        "a stale one-shot completion resurrected the old mood"
    );
    let current = controller.current_action().expect("sad action");
    assert_eq!(current.clip.name.as_ref(), "Sad");
    assert_eq!(controller.base_emotion(), EmotionState::Sad);
}

#[test]
fn mood_change_during_return_pause_cancels_the_restore() {
    let index = index_of(&[("Idle", 1.0), ("Hi", 0.5), ("Sad", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    controller.play_animation(&index, "hi", &mut events);
    // Gap (0.55) + clip duration (0.5) puts us inside the return pause.
    drive(&mut controller, &index, &mut events, 1.1);
    assert!(controller.is_current_finished(), "gesture should have clamped by now");

    controller.set_emotion(&index, EmotionState::Sad, &mut events);
    events.drain();
    drive(&mut controller, &index, &mut events, 1.0);
    let drained = events.drain();
    assert!(
        !drained.iter().any(|event| matches!(event, AvatarEvent::ClipStarted { name, .. } if name.as_ref() == "Idle")),
        "cancelled restore still fired"
    );
    assert_eq!(controller.current_action().expect("sad").clip.name.as_ref(), "Sad");
}

#[test]
fn lookup_miss_keeps_the_current_action() {
    let index = index_of(&[("Idle", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    events.drain();

    controller.play_animation(&index, "bogus_xyz", &mut events);
    let drained = events.drain();
    assert!(drained.iter().any(|event| matches!(event, AvatarEvent::ClipMissing { name } if name == "bogus_xyz")));
    assert_eq!(controller.current_action().expect("idle").clip.name.as_ref(), "Idle");
}

#[test]
fn mood_with_missing_clip_still_changes_the_mood() {
    let index = index_of(&[("Idle", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    controller.set_emotion(&index, EmotionState::Sad, &mut events);

    assert_eq!(controller.base_emotion(), EmotionState::Sad);
    // The avatar holds its last pose rather than snapping to nothing.
    assert_eq!(controller.current_action().expect("held pose").clip.name.as_ref(), "Idle");
}

#[test]
fn looping_actions_wrap_time() {
    let index = index_of(&[("Idle", 0.5)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 4.3);
    let current = controller.current_action().expect("idle");
    assert!(current.time >= 0.0 && current.time < 0.5, "time {} escaped the loop", current.time);
    assert!(!current.is_finished());
}

#[test]
fn stop_all_clears_every_action() {
    let index = index_of(&[("Idle", 1.0), ("Wave", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    drive(&mut controller, &index, &mut events, 0.5);
    controller.set_emotion(&index, EmotionState::Happy, &mut events);
    controller.stop_all();

    assert!(controller.current_action().is_none());
    assert!(controller.outgoing_action().is_none());
    // Ticking an empty controller is a no-op, not a panic.
    drive(&mut controller, &index, &mut events, 1.0);
}

#[test]
fn generations_are_monotonic_per_play() {
    let index = index_of(&[("Idle", 1.0), ("Wave", 1.0)]);
    let mut events = EventBus::new();
    let mut controller = PlaybackController::new(FadeConfig::default());

    controller.set_emotion(&index, EmotionState::Neutral, &mut events);
    let first = controller.current_generation();
    controller.set_emotion(&index, EmotionState::Happy, &mut events);
    let second = controller.current_generation();
    assert!(second > first);

    let drained = events.drain();
    let started: Vec<u64> = drained
        .iter()
        .filter_map(|event| match event {
            AvatarEvent::ClipStarted { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![first, second]);
}
