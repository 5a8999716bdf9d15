use crate::clip::AnimationClip;
use crate::emotion::{EmotionState, CLIP_KEYWORDS};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Name -> clip lookup over the active model's clip set. Rebuilt wholesale
/// on model change, never patched in place.
#[derive(Default)]
pub struct ClipIndex {
    order: Vec<Arc<AnimationClip>>,
    folded_names: Vec<String>,
    exact: HashMap<Arc<str>, usize>,
    folded: HashMap<String, usize>,
    keywords: HashMap<&'static str, SmallVec<[usize; 2]>>,
}

impl ClipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(clips: &[Arc<AnimationClip>]) -> Self {
        let mut index = Self::default();
        for clip in clips {
            index.register(Arc::clone(clip));
        }
        index
    }

    fn register(&mut self, clip: Arc<AnimationClip>) {
        let slot = self.order.len();
        let folded = clip.name.to_ascii_lowercase();
        self.exact.entry(Arc::clone(&clip.name)).or_insert(slot);
        self.folded.entry(folded.clone()).or_insert(slot);
        for &(keyword, _) in CLIP_KEYWORDS {
            if folded.contains(keyword) {
                self.keywords.entry(keyword).or_default().push(slot);
            }
        }
        self.folded_names.push(folded);
        self.order.push(clip);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|clip| clip.name.as_ref())
    }

    /// Resolves a clip name: exact match, then case-folded, then the query's
    /// keyword bucket, then substring containment in either direction.
    /// Ties break to the first-registered clip. Never panics.
    pub fn lookup(&self, name: &str) -> Option<Arc<AnimationClip>> {
        if let Some(&slot) = self.exact.get(name) {
            return Some(Arc::clone(&self.order[slot]));
        }
        let folded = name.to_ascii_lowercase();
        if let Some(&slot) = self.folded.get(&folded) {
            return Some(Arc::clone(&self.order[slot]));
        }
        for &(keyword, _) in CLIP_KEYWORDS {
            if !folded.contains(keyword) {
                continue;
            }
            if let Some(bucket) = self.keywords.get(keyword) {
                if let Some(&slot) = bucket.first() {
                    return Some(Arc::clone(&self.order[slot]));
                }
            }
        }
        for (slot, clip_folded) in self.folded_names.iter().enumerate() {
            if clip_folded.contains(&folded) || folded.contains(clip_folded.as_str()) {
                return Some(Arc::clone(&self.order[slot]));
            }
        }
        None
    }

    /// Enumerated emotion dispatch; keyword matching only kicks in when the
    /// canonical key has no direct entry.
    pub fn resolve_emotion(&self, state: EmotionState) -> Option<Arc<AnimationClip>> {
        self.lookup(state.clip_key())
    }
}
