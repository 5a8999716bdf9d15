use crate::emotion::EmotionState;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct FadeConfig {
    #[serde(default = "FadeConfig::default_fade_duration")]
    pub fade_duration: f32,
    #[serde(default = "FadeConfig::default_settle_gap")]
    pub settle_gap: f32,
    #[serde(default = "FadeConfig::default_one_shot_return_pause")]
    pub one_shot_return_pause: f32,
    #[serde(default = "FadeConfig::default_time_scale")]
    pub time_scale: f32,
}

impl FadeConfig {
    fn default_fade_duration() -> f32 {
        0.4
    }

    fn default_settle_gap() -> f32 {
        0.15
    }

    fn default_one_shot_return_pause() -> f32 {
        0.25
    }

    fn default_time_scale() -> f32 {
        1.0
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_duration: Self::default_fade_duration(),
            settle_gap: Self::default_settle_gap(),
            one_shot_return_pause: Self::default_one_shot_return_pause(),
            time_scale: Self::default_time_scale(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TalkingConfig {
    #[serde(default = "TalkingConfig::default_variants")]
    pub variants: Vec<String>,
    #[serde(default = "TalkingConfig::default_fallback_key")]
    pub fallback_key: String,
    #[serde(default = "TalkingConfig::default_settle")]
    pub settle: f32,
    #[serde(default = "TalkingConfig::default_gap")]
    pub gap: f32,
    #[serde(default = "TalkingConfig::default_retry_delay")]
    pub retry_delay: f32,
}

impl TalkingConfig {
    fn default_variants() -> Vec<String> {
        vec!["talking_01".to_string(), "talking_02".to_string(), "talking_03".to_string()]
    }

    fn default_fallback_key() -> String {
        "talking".to_string()
    }

    fn default_settle() -> f32 {
        0.2
    }

    fn default_gap() -> f32 {
        1.2
    }

    fn default_retry_delay() -> f32 {
        2.5
    }
}

impl Default for TalkingConfig {
    fn default() -> Self {
        Self {
            variants: Self::default_variants(),
            fallback_key: Self::default_fallback_key(),
            settle: Self::default_settle(),
            gap: Self::default_gap(),
            retry_delay: Self::default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_ttl_seconds")]
    pub ttl_seconds: f32,
    #[serde(default = "CacheConfig::default_sweep_interval")]
    pub sweep_interval: f32,
}

impl CacheConfig {
    fn default_ttl_seconds() -> f32 {
        300.0
    }

    fn default_sweep_interval() -> f32 {
        60.0
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: Self::default_ttl_seconds(),
            sweep_interval: Self::default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointerConfig {
    #[serde(default = "PointerConfig::default_blend")]
    pub blend: f32,
    #[serde(default = "PointerConfig::default_tilt_limit")]
    pub tilt_limit: f32,
    #[serde(default = "PointerConfig::default_turn_limit")]
    pub turn_limit: f32,
}

impl PointerConfig {
    fn default_blend() -> f32 {
        0.06
    }

    fn default_tilt_limit() -> f32 {
        0.25
    }

    fn default_turn_limit() -> f32 {
        0.32
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            blend: Self::default_blend(),
            tilt_limit: Self::default_tilt_limit(),
            turn_limit: Self::default_turn_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "ModelConfig::default_min_opacity")]
    pub min_opacity: f32,
    #[serde(default = "ModelConfig::default_scale")]
    pub scale: f32,
    #[serde(default = "ModelConfig::default_position")]
    pub position: [f32; 3],
}

impl ModelConfig {
    fn default_min_opacity() -> f32 {
        0.85
    }

    fn default_scale() -> f32 {
        1.0
    }

    fn default_position() -> [f32; 3] {
        [0.0, -0.95, 0.0]
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            min_opacity: Self::default_min_opacity(),
            scale: Self::default_scale(),
            position: Self::default_position(),
        }
    }
}

/// Per-emotion rendering hint consumed by the embedding scene's light rig.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LightingHint {
    pub intensity: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvatarConfig {
    #[serde(default)]
    pub fade: FadeConfig,
    #[serde(default)]
    pub talking: TalkingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub lighting: HashMap<String, LightingHint>,
}

impl AvatarConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[avatar] config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    /// Configured hint for a state, or a built-in default keyed off the mood.
    pub fn lighting_hint(&self, state: EmotionState) -> LightingHint {
        if let Some(hint) = self.lighting.get(state.label()) {
            return *hint;
        }
        match state {
            EmotionState::Happy | EmotionState::Greeting => {
                LightingHint { intensity: 1.2, color: [1.0, 0.97, 0.9] }
            }
            EmotionState::Sad => LightingHint { intensity: 0.7, color: [0.8, 0.85, 1.0] },
            EmotionState::Thinking => LightingHint { intensity: 0.9, color: [0.95, 0.95, 1.0] },
            EmotionState::Rest => LightingHint { intensity: 0.5, color: [0.9, 0.9, 0.95] },
            _ => LightingHint { intensity: 1.0, color: [1.0, 1.0, 1.0] },
        }
    }
}
