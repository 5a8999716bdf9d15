use crate::clip::{AnimationClip, KeyframeTrack, TrackProperty};
use std::sync::Arc;

/// Joints whose rotation tracks are stripped from imported clips. Authored
/// root or torso rotation would re-orient the whole character, which the
/// embedding scene controls itself.
pub const ROTATION_BLACKLIST: &[&str] = &["root", "hips", "spine", "shoulder"];

fn joint_is_blacklisted(joint: &str) -> bool {
    let folded = joint.to_ascii_lowercase();
    ROTATION_BLACKLIST.iter().any(|keyword| folded.contains(keyword))
}

/// Removes root-motion channels from an imported clip: every translation
/// track goes (any authored translation can displace the avatar), and
/// rotation tracks on blacklisted torso joints go with them. Surviving
/// tracks are carried over untouched.
pub fn filter_root_motion(clip: &AnimationClip) -> AnimationClip {
    let tracks: Vec<KeyframeTrack> = clip
        .tracks
        .iter()
        .filter(|track| match track.property {
            TrackProperty::Translation => false,
            TrackProperty::Rotation => !joint_is_blacklisted(&track.joint),
            TrackProperty::Scale => true,
        })
        .cloned()
        .collect();
    AnimationClip {
        name: Arc::clone(&clip.name),
        duration: clip.duration,
        tracks: Arc::from(tracks.into_boxed_slice()),
    }
}
