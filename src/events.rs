use crate::assets::AssetKind;
use crate::emotion::EmotionState;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum AvatarEvent {
    EmotionChanged { state: EmotionState },
    ClipStarted { name: Arc<str>, generation: u64 },
    ClipFinished { name: Arc<str>, generation: u64 },
    ClipMissing { name: String },
    TalkingStarted,
    TalkingStopped { restored: EmotionState },
    ClipReady { key: String },
    ClipFailed { key: String, error: String },
    ModelReady { url: String },
    ModelFailed { url: String, error: String },
    Evicted { key: String, kind: AssetKind },
}

impl fmt::Display for AvatarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarEvent::EmotionChanged { state } => {
                write!(f, "EmotionChanged state={}", state.label())
            }
            AvatarEvent::ClipStarted { name, generation } => {
                write!(f, "ClipStarted name={name} generation={generation}")
            }
            AvatarEvent::ClipFinished { name, generation } => {
                write!(f, "ClipFinished name={name} generation={generation}")
            }
            AvatarEvent::ClipMissing { name } => write!(f, "ClipMissing name={name}"),
            AvatarEvent::TalkingStarted => write!(f, "TalkingStarted"),
            AvatarEvent::TalkingStopped { restored } => {
                write!(f, "TalkingStopped restored={}", restored.label())
            }
            AvatarEvent::ClipReady { key } => write!(f, "ClipReady key={key}"),
            AvatarEvent::ClipFailed { key, error } => {
                write!(f, "ClipFailed key={key} error={error}")
            }
            AvatarEvent::ModelReady { url } => write!(f, "ModelReady url={url}"),
            AvatarEvent::ModelFailed { url, error } => {
                write!(f, "ModelFailed url={url} error={error}")
            }
            AvatarEvent::Evicted { key, kind } => {
                write!(f, "Evicted key={key} kind={}", kind.label())
            }
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    queue: Vec<AvatarEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AvatarEvent) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> Vec<AvatarEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
