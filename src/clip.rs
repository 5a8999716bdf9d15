use anyhow::{anyhow, bail, Result};
use glam::{Quat, Vec3};
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrackProperty {
    Translation,
    Rotation,
    Scale,
}

impl TrackProperty {
    pub fn label(self) -> &'static str {
        match self {
            TrackProperty::Translation => "translation",
            TrackProperty::Rotation => "rotation",
            TrackProperty::Scale => "scale",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrackValues {
    Vec3(Arc<[Vec3]>),
    Quat(Arc<[Quat]>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            TrackValues::Vec3(values) => values.len(),
            TrackValues::Quat(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A per-joint, per-property timeline of sampled values. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    pub joint: Arc<str>,
    pub property: TrackProperty,
    pub times: Arc<[f32]>,
    pub values: TrackValues,
}

impl KeyframeTrack {
    pub fn new(
        joint: impl Into<Arc<str>>,
        property: TrackProperty,
        times: Vec<f32>,
        values: TrackValues,
    ) -> Result<Self> {
        if times.is_empty() {
            bail!("Keyframe track must contain at least one keyframe");
        }
        if times.len() != values.len() {
            bail!("Keyframe track time/value count mismatch ({} vs {})", times.len(), values.len());
        }
        let mut previous = f32::NEG_INFINITY;
        for &time in &times {
            if !time.is_finite() {
                bail!("Keyframe track contains non-finite time value");
            }
            if time < 0.0 {
                bail!("Keyframe track time cannot be negative");
            }
            if time < previous {
                bail!("Keyframe track times must be non-decreasing");
            }
            previous = time;
        }
        match (property, &values) {
            (TrackProperty::Rotation, TrackValues::Quat(_)) => {}
            (TrackProperty::Rotation, TrackValues::Vec3(_)) => {
                bail!("Rotation track requires quaternion values");
            }
            (_, TrackValues::Quat(_)) => {
                bail!("{} track requires vector values", property.label());
            }
            _ => {}
        }
        Ok(Self {
            joint: joint.into(),
            property,
            times: Arc::from(times.into_boxed_slice()),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Drops interior keyframes whose value matches both neighbours. The first
    /// and last keyframes always survive so the track's span is preserved.
    pub fn without_redundant_keyframes(&self) -> KeyframeTrack {
        let len = self.times.len();
        if len <= 2 {
            return self.clone();
        }
        let mut keep: Vec<usize> = Vec::with_capacity(len);
        for index in 0..len {
            if index == 0 || index == len - 1 {
                keep.push(index);
                continue;
            }
            let redundant = match &self.values {
                TrackValues::Vec3(values) => {
                    values[index] == values[index - 1] && values[index] == values[index + 1]
                }
                TrackValues::Quat(values) => {
                    values[index] == values[index - 1] && values[index] == values[index + 1]
                }
            };
            if !redundant {
                keep.push(index);
            }
        }
        if keep.len() == len {
            return self.clone();
        }
        let times: Vec<f32> = keep.iter().map(|&i| self.times[i]).collect();
        let values = match &self.values {
            TrackValues::Vec3(values) => {
                TrackValues::Vec3(Arc::from(keep.iter().map(|&i| values[i]).collect::<Vec<_>>()))
            }
            TrackValues::Quat(values) => {
                TrackValues::Quat(Arc::from(keep.iter().map(|&i| values[i]).collect::<Vec<_>>()))
            }
        };
        KeyframeTrack {
            joint: Arc::clone(&self.joint),
            property: self.property,
            times: Arc::from(times.into_boxed_slice()),
            values,
        }
    }

    pub fn sample_vec3(&self, time: f32) -> Option<Vec3> {
        let TrackValues::Vec3(values) = &self.values else {
            return None;
        };
        let (index, next, t) = self.segment_at(time)?;
        Some(values[index].lerp(values[next], t))
    }

    pub fn sample_quat(&self, time: f32) -> Option<Quat> {
        let TrackValues::Quat(values) = &self.values else {
            return None;
        };
        let (index, next, t) = self.segment_at(time)?;
        Some(values[index].slerp(values[next], t))
    }

    fn segment_at(&self, time: f32) -> Option<(usize, usize, f32)> {
        let times = self.times.as_ref();
        if times.is_empty() {
            return None;
        }
        if time <= times[0] {
            return Some((0, 0, 0.0));
        }
        let last = times.len() - 1;
        if time >= times[last] {
            return Some((last, last, 0.0));
        }
        let mut index = 0;
        while index + 1 < times.len() && times[index + 1] <= time {
            index += 1;
        }
        let span = (times[index + 1] - times[index]).max(f32::EPSILON);
        Some((index, index + 1, (time - times[index]) / span))
    }
}

/// A named, fixed-duration set of keyframe tracks. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: Arc<str>,
    pub duration: f32,
    pub tracks: Arc<[KeyframeTrack]>,
}

impl AnimationClip {
    pub fn from_tracks(name: impl Into<Arc<str>>, tracks: Vec<KeyframeTrack>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(anyhow!("Animation clip name cannot be empty"));
        }
        let duration = tracks.iter().map(KeyframeTrack::duration).fold(0.0_f32, f32::max);
        Ok(Self { name, duration, tracks: Arc::from(tracks.into_boxed_slice()) })
    }

    pub fn track(&self, joint: &str, property: TrackProperty) -> Option<&KeyframeTrack> {
        self.tracks.iter().find(|track| track.property == property && track.joint.as_ref() == joint)
    }

    /// Returns a copy with redundant interior keyframes dropped from every track.
    pub fn optimized(&self) -> AnimationClip {
        let tracks: Vec<KeyframeTrack> =
            self.tracks.iter().map(KeyframeTrack::without_redundant_keyframes).collect();
        AnimationClip {
            name: Arc::clone(&self.name),
            duration: self.duration,
            tracks: Arc::from(tracks.into_boxed_slice()),
        }
    }
}
