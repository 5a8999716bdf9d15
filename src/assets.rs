use crate::clip::{AnimationClip, KeyframeTrack, TrackProperty, TrackValues};
use crate::config::{CacheConfig, ModelConfig};
use crate::events::{AvatarEvent, EventBus};
use crate::track_filter::filter_root_motion;
use anyhow::{anyhow, Context, Result};
use glam::{Quat, Vec3};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub mod model_import;

pub use model_import::{Material, MeshPrimitive, ModelScene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Clip,
    Model,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Clip => "clip",
            AssetKind::Model => "model",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// TTL-valid hit; entry age refreshed, payload available now.
    Cached,
    /// A fetch for this key is already running; no second fetch is issued.
    InFlight,
    /// Fetch started; poll completion via the pump events.
    Started,
}

pub enum FetchPoll {
    Pending,
    Ready(Vec<u8>),
    Failed(anyhow::Error),
}

/// Pollable byte source for named assets. `begin` is called once per
/// distinct in-flight URL, `cancel` on teardown.
pub trait AssetFetcher {
    fn begin(&mut self, url: &str);
    fn poll(&mut self, url: &str) -> FetchPoll;
    fn cancel(&mut self, url: &str) {
        let _ = url;
    }
}

/// Filesystem-backed fetcher for embeddings that ship assets locally.
pub struct FileFetcher {
    base: PathBuf,
}

impl FileFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetFetcher for FileFetcher {
    fn begin(&mut self, _url: &str) {}

    fn poll(&mut self, url: &str) -> FetchPoll {
        let path = self.base.join(url);
        match fs::read(&path).with_context(|| format!("Failed to read asset {}", path.display())) {
            Ok(bytes) => FetchPoll::Ready(bytes),
            Err(err) => FetchPoll::Failed(err),
        }
    }
}

/// Receives evicted payloads so the render layer can free the GPU resources
/// it uploaded for them. Invoked before the cache entry is removed, always.
pub trait ResourceDisposer {
    fn dispose_model(&mut self, url: &str, model: &ModelScene);

    fn dispose_clip(&mut self, key: &str, clip: &AnimationClip) {
        let _ = (key, clip);
    }
}

pub struct NullDisposer;

impl ResourceDisposer for NullDisposer {
    fn dispose_model(&mut self, _url: &str, _model: &ModelScene) {}
}

struct CacheEntry<T> {
    payload: T,
    age: f32,
}

/// Async-fetching TTL cache over two pools: standalone clips keyed by
/// logical key, and full models keyed by source URL. Injected wholesale into
/// the avatar so tests get isolated instances instead of hidden globals.
pub struct AssetCache {
    cfg: CacheConfig,
    model_cfg: ModelConfig,
    fetcher: Box<dyn AssetFetcher>,
    disposer: Box<dyn ResourceDisposer>,
    clips: HashMap<String, CacheEntry<Arc<AnimationClip>>>,
    models: HashMap<String, CacheEntry<Arc<ModelScene>>>,
    pending_clips: HashMap<String, String>,
    pending_models: HashSet<String>,
    sweep_timer: f32,
}

impl AssetCache {
    pub fn new(
        cfg: CacheConfig,
        model_cfg: ModelConfig,
        fetcher: Box<dyn AssetFetcher>,
        disposer: Box<dyn ResourceDisposer>,
    ) -> Self {
        Self {
            cfg,
            model_cfg,
            fetcher,
            disposer,
            clips: HashMap::new(),
            models: HashMap::new(),
            pending_clips: HashMap::new(),
            pending_models: HashSet::new(),
            sweep_timer: 0.0,
        }
    }

    pub fn clip(&self, key: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(key).map(|entry| Arc::clone(&entry.payload))
    }

    pub fn model(&self, url: &str) -> Option<Arc<ModelScene>> {
        self.models.get(url).map(|entry| Arc::clone(&entry.payload))
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_clips.len() + self.pending_models.len()
    }

    /// Preload path for bundled clips that never go through a fetch.
    pub fn insert_clip(&mut self, key: impl Into<String>, clip: Arc<AnimationClip>) {
        let key = key.into();
        if let Some(old) = self.clips.remove(&key) {
            self.disposer.dispose_clip(&key, &old.payload);
        }
        self.clips.insert(key, CacheEntry { payload: clip, age: 0.0 });
    }

    pub fn request_clip(&mut self, key: &str, url: &str) -> RequestState {
        if let Some(entry) = self.clips.get_mut(key) {
            if entry.age <= self.cfg.ttl_seconds {
                entry.age = 0.0;
                return RequestState::Cached;
            }
        }
        if self.pending_clips.contains_key(key) {
            return RequestState::InFlight;
        }
        self.fetcher.begin(url);
        self.pending_clips.insert(key.to_string(), url.to_string());
        RequestState::Started
    }

    pub fn request_model(&mut self, url: &str) -> RequestState {
        if let Some(entry) = self.models.get_mut(url) {
            if entry.age <= self.cfg.ttl_seconds {
                entry.age = 0.0;
                return RequestState::Cached;
            }
        }
        if self.pending_models.contains(url) {
            return RequestState::InFlight;
        }
        self.fetcher.begin(url);
        self.pending_models.insert(url.to_string());
        RequestState::Started
    }

    /// Polls in-flight fetches and post-processes whatever arrived. Failures
    /// are never cached; the key stays loadable for a later retry.
    pub fn pump(&mut self, events: &mut EventBus) {
        let clip_keys: Vec<(String, String)> =
            self.pending_clips.iter().map(|(key, url)| (key.clone(), url.clone())).collect();
        for (key, url) in clip_keys {
            match self.fetcher.poll(&url) {
                FetchPoll::Pending => {}
                FetchPoll::Ready(bytes) => {
                    self.pending_clips.remove(&key);
                    match parse_clip_document(&key, &bytes) {
                        Ok(clip) => {
                            let prepared = filter_root_motion(&clip.optimized());
                            self.insert_clip(key.clone(), Arc::new(prepared));
                            events.push(AvatarEvent::ClipReady { key });
                        }
                        Err(err) => {
                            eprintln!("[assets] clip '{key}' failed to parse: {err:#}");
                            events.push(AvatarEvent::ClipFailed { key, error: format!("{err:#}") });
                        }
                    }
                }
                FetchPoll::Failed(err) => {
                    self.pending_clips.remove(&key);
                    eprintln!("[assets] clip '{key}' failed to load: {err:#}");
                    events.push(AvatarEvent::ClipFailed { key, error: format!("{err:#}") });
                }
            }
        }
        let model_urls: Vec<String> = self.pending_models.iter().cloned().collect();
        for url in model_urls {
            match self.fetcher.poll(&url) {
                FetchPoll::Pending => {}
                FetchPoll::Ready(bytes) => {
                    self.pending_models.remove(&url);
                    match ModelScene::from_gltf_bytes(&url, &bytes, &self.model_cfg) {
                        Ok(model) => {
                            if let Some(old) = self.models.remove(&url) {
                                self.disposer.dispose_model(&url, &old.payload);
                            }
                            self.models.insert(url.clone(), CacheEntry {
                                payload: Arc::new(model),
                                age: 0.0,
                            });
                            events.push(AvatarEvent::ModelReady { url });
                        }
                        Err(err) => {
                            eprintln!("[assets] model '{url}' failed to parse: {err:#}");
                            events.push(AvatarEvent::ModelFailed { url, error: format!("{err:#}") });
                        }
                    }
                }
                FetchPoll::Failed(err) => {
                    self.pending_models.remove(&url);
                    eprintln!("[assets] model '{url}' failed to load: {err:#}");
                    events.push(AvatarEvent::ModelFailed { url, error: format!("{err:#}") });
                }
            }
        }
    }

    /// Ages entries and runs the disposal sweep on its fixed interval.
    pub fn tick(&mut self, dt: f32, events: &mut EventBus) {
        if dt <= 0.0 {
            return;
        }
        for entry in self.clips.values_mut() {
            entry.age += dt;
        }
        for entry in self.models.values_mut() {
            entry.age += dt;
        }
        self.sweep_timer += dt;
        if self.sweep_timer >= self.cfg.sweep_interval {
            self.sweep_timer = 0.0;
            self.sweep(events);
        }
    }

    /// Evicts everything older than the TTL. Disposal runs before the map
    /// entry goes away; skipping it would leak whatever the render layer
    /// uploaded for the asset.
    pub fn sweep(&mut self, events: &mut EventBus) {
        let expired_clips: Vec<String> = self
            .clips
            .iter()
            .filter(|(_, entry)| entry.age > self.cfg.ttl_seconds)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired_clips {
            if let Some(entry) = self.clips.remove(&key) {
                self.disposer.dispose_clip(&key, &entry.payload);
            }
            events.push(AvatarEvent::Evicted { key, kind: AssetKind::Clip });
        }
        let expired_models: Vec<String> = self
            .models
            .iter()
            .filter(|(_, entry)| entry.age > self.cfg.ttl_seconds)
            .map(|(url, _)| url.clone())
            .collect();
        for url in expired_models {
            if let Some(entry) = self.models.remove(&url) {
                self.disposer.dispose_model(&url, &entry.payload);
            }
            events.push(AvatarEvent::Evicted { key: url, kind: AssetKind::Model });
        }
    }

    /// Teardown: cancels in-flight fetches and disposes every entry.
    pub fn clear(&mut self, events: &mut EventBus) {
        for url in self.pending_clips.values() {
            self.fetcher.cancel(url);
        }
        self.pending_clips.clear();
        for url in self.pending_models.iter() {
            self.fetcher.cancel(url);
        }
        self.pending_models.clear();
        for (key, entry) in self.clips.drain().collect::<Vec<_>>() {
            self.disposer.dispose_clip(&key, &entry.payload);
            events.push(AvatarEvent::Evicted { key, kind: AssetKind::Clip });
        }
        for (url, entry) in self.models.drain().collect::<Vec<_>>() {
            self.disposer.dispose_model(&url, &entry.payload);
            events.push(AvatarEvent::Evicted { key: url, kind: AssetKind::Model });
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClipFileDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tracks: Vec<TrackFileDoc>,
}

#[derive(Debug, Deserialize)]
struct TrackFileDoc {
    joint: String,
    property: TrackPropertyFile,
    times: Vec<f32>,
    values: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TrackPropertyFile {
    Translation,
    Rotation,
    Scale,
}

/// Parses the standalone clip document format: a named list of per-joint
/// keyframe tracks with rotation values as quaternions.
pub fn parse_clip_document(key: &str, bytes: &[u8]) -> Result<AnimationClip> {
    let doc: ClipFileDoc = serde_json::from_slice(bytes)
        .with_context(|| format!("Failed to parse clip document '{key}'"))?;
    let mut tracks: Vec<KeyframeTrack> = Vec::with_capacity(doc.tracks.len());
    for raw in doc.tracks {
        let (property, values) = match raw.property {
            TrackPropertyFile::Rotation => {
                let mut quats: Vec<Quat> = Vec::with_capacity(raw.values.len());
                for value in &raw.values {
                    let [x, y, z, w] = value.as_slice() else {
                        return Err(anyhow!(
                            "Clip '{key}' rotation keyframe on '{}' must have 4 components",
                            raw.joint
                        ));
                    };
                    let quat = Quat::from_xyzw(*x, *y, *z, *w);
                    quats.push(if quat.length_squared() > 0.0 { quat.normalize() } else { Quat::IDENTITY });
                }
                (TrackProperty::Rotation, TrackValues::Quat(Arc::from(quats)))
            }
            TrackPropertyFile::Translation | TrackPropertyFile::Scale => {
                let property = match raw.property {
                    TrackPropertyFile::Translation => TrackProperty::Translation,
                    _ => TrackProperty::Scale,
                };
                let mut vectors: Vec<Vec3> = Vec::with_capacity(raw.values.len());
                for value in &raw.values {
                    let [x, y, z] = value.as_slice() else {
                        return Err(anyhow!(
                            "Clip '{key}' {} keyframe on '{}' must have 3 components",
                            property.label(),
                            raw.joint
                        ));
                    };
                    vectors.push(Vec3::new(*x, *y, *z));
                }
                (property, TrackValues::Vec3(Arc::from(vectors)))
            }
        };
        let track = KeyframeTrack::new(raw.joint.as_str(), property, raw.times, values)
            .with_context(|| format!("Invalid track in clip '{key}'"))?;
        tracks.push(track);
    }
    let name = doc.name.unwrap_or_else(|| key.to_string());
    AnimationClip::from_tracks(name, tracks)
}
