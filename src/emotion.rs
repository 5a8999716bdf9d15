use serde::Deserialize;

/// The avatar's current mood or gesture. Greeting, Agree and Disagree are
/// one-shot gestures; every other state is a looping base mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionState {
    Neutral,
    Happy,
    Sad,
    Thinking,
    TalkingBase,
    Listening,
    Greeting,
    Agree,
    Disagree,
    Rest,
}

impl Default for EmotionState {
    fn default() -> Self {
        EmotionState::Neutral
    }
}

impl EmotionState {
    pub fn is_gesture(self) -> bool {
        matches!(self, EmotionState::Greeting | EmotionState::Agree | EmotionState::Disagree)
    }

    /// Canonical clip key consulted before any keyword fallback.
    pub fn clip_key(self) -> &'static str {
        match self {
            EmotionState::Neutral => "idle",
            EmotionState::Happy => "wave",
            EmotionState::Sad => "sad",
            EmotionState::Thinking => "thinking",
            EmotionState::TalkingBase => "talking",
            EmotionState::Listening => "listening",
            EmotionState::Greeting => "hi",
            EmotionState::Agree => "yes",
            EmotionState::Disagree => "no",
            EmotionState::Rest => "rest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmotionState::Neutral => "neutral",
            EmotionState::Happy => "happy",
            EmotionState::Sad => "sad",
            EmotionState::Thinking => "thinking",
            EmotionState::TalkingBase => "talking_base",
            EmotionState::Listening => "listening",
            EmotionState::Greeting => "greeting",
            EmotionState::Agree => "agree",
            EmotionState::Disagree => "disagree",
            EmotionState::Rest => "rest",
        }
    }
}

/// Keyword buckets shared by the clip index and gesture classification.
/// Ordered by specificity: "think" must win over the embedded "hi", and
/// "nod" over the embedded "no".
pub const CLIP_KEYWORDS: &[(&str, EmotionState)] = &[
    ("idle", EmotionState::Neutral),
    ("wave", EmotionState::Happy),
    ("talk", EmotionState::TalkingBase),
    ("think", EmotionState::Thinking),
    ("listen", EmotionState::Listening),
    ("sad", EmotionState::Sad),
    ("rest", EmotionState::Rest),
    ("hello", EmotionState::Greeting),
    ("hi", EmotionState::Greeting),
    ("nod", EmotionState::Agree),
    ("yes", EmotionState::Agree),
    ("no", EmotionState::Disagree),
];

/// Best-effort bucket for an externally authored clip name.
pub fn classify_clip(name: &str) -> Option<EmotionState> {
    let folded = name.to_ascii_lowercase();
    CLIP_KEYWORDS
        .iter()
        .find(|(keyword, _)| folded.contains(keyword))
        .map(|&(_, state)| state)
}

/// True when a clip name resolves to a one-shot gesture bucket.
pub fn is_gesture_clip(name: &str) -> bool {
    classify_clip(name).is_some_and(EmotionState::is_gesture)
}
