pub mod assets;
pub mod avatar;
pub mod clip;
pub mod config;
pub mod emotion;
pub mod events;
pub mod playback;
pub mod pointer;
pub mod registry;
pub mod talking;
pub mod track_filter;

pub use avatar::Avatar;
pub use config::AvatarConfig;
pub use emotion::EmotionState;
pub use events::AvatarEvent;
