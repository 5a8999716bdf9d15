use crate::clip::{AnimationClip, KeyframeTrack, TrackProperty, TrackValues};
use crate::config::ModelConfig;
use crate::track_filter::filter_root_motion;
use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use gltf::animation::util::{ReadOutputs, Rotations};
use gltf::animation::Property;
use std::collections::HashMap;
use std::sync::Arc;

/// One drawable primitive of an imported model. Culling and shadow flags are
/// forced off at import so render cost stays predictable.
#[derive(Clone, Debug)]
pub struct MeshPrimitive {
    pub name: Arc<str>,
    pub vertex_count: usize,
    pub index_count: usize,
    pub frustum_culled: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: Arc<str>,
    pub opacity: f32,
    pub transparent: bool,
}

/// A post-processed skeletal model: normalized placement, clamped material
/// opacity, and the clip set the registry indexes.
#[derive(Clone, Debug)]
pub struct ModelScene {
    pub name: Arc<str>,
    pub meshes: Vec<MeshPrimitive>,
    pub materials: Vec<Material>,
    pub clips: Vec<Arc<AnimationClip>>,
    pub scale: f32,
    pub position: Vec3,
}

impl ModelScene {
    pub fn from_gltf_bytes(url: &str, bytes: &[u8], cfg: &ModelConfig) -> Result<ModelScene> {
        let (document, buffers, _images) = gltf::import_slice(bytes)
            .with_context(|| format!("Failed to import model from '{url}'"))?;

        let name: Arc<str> = Arc::from(model_name_from_url(url));

        let node_names: HashMap<usize, String> = document
            .nodes()
            .map(|node| {
                let label =
                    node.name().map(|n| n.to_string()).unwrap_or_else(|| format!("node_{}", node.index()));
                (node.index(), label)
            })
            .collect();

        let mut meshes: Vec<MeshPrimitive> = Vec::new();
        for mesh in document.meshes() {
            let mesh_name = mesh.name().map(|n| n.to_string()).unwrap_or_else(|| format!("mesh_{}", mesh.index()));
            for primitive in mesh.primitives() {
                let vertex_count = primitive
                    .get(&gltf::Semantic::Positions)
                    .map(|accessor| accessor.count())
                    .unwrap_or(0);
                let index_count = primitive.indices().map(|accessor| accessor.count()).unwrap_or(0);
                meshes.push(MeshPrimitive {
                    name: Arc::from(mesh_name.as_str()),
                    vertex_count,
                    index_count,
                    frustum_culled: false,
                    cast_shadow: false,
                    receive_shadow: false,
                });
            }
        }

        let mut materials: Vec<Material> = Vec::new();
        for (index, material) in document.materials().enumerate() {
            let material_name =
                material.name().map(|n| n.to_string()).unwrap_or_else(|| format!("material_{index}"));
            let alpha = material.pbr_metallic_roughness().base_color_factor()[3];
            let opacity = alpha.max(cfg.min_opacity);
            materials.push(Material {
                name: Arc::from(material_name),
                opacity,
                transparent: opacity < 1.0,
            });
        }

        let mut clips: Vec<Arc<AnimationClip>> = Vec::new();
        for (anim_index, animation) in document.animations().enumerate() {
            let clip_name = animation
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("animation_{anim_index}"));

            let mut tracks: Vec<KeyframeTrack> = Vec::new();
            for channel in animation.channels() {
                let target_node = channel.target().node();
                let joint = node_names
                    .get(&target_node.index())
                    .cloned()
                    .unwrap_or_else(|| format!("node_{}", target_node.index()));

                if channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline {
                    eprintln!(
                        "[assets] animation '{clip_name}' uses CubicSpline interpolation; skipping channel (node {}).",
                        target_node.index()
                    );
                    continue;
                }

                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(inputs) = reader.read_inputs() else {
                    continue;
                };
                let times: Vec<f32> = inputs.collect();
                if times.is_empty() {
                    continue;
                }
                let Some(outputs) = reader.read_outputs() else {
                    continue;
                };

                let (property, values) = match (channel.target().property(), outputs) {
                    (Property::Translation, ReadOutputs::Translations(raw)) => {
                        let vectors: Vec<Vec3> = raw.map(Vec3::from_array).collect();
                        (TrackProperty::Translation, TrackValues::Vec3(Arc::from(vectors)))
                    }
                    (Property::Scale, ReadOutputs::Scales(raw)) => {
                        let vectors: Vec<Vec3> = raw.map(Vec3::from_array).collect();
                        (TrackProperty::Scale, TrackValues::Vec3(Arc::from(vectors)))
                    }
                    (Property::Rotation, ReadOutputs::Rotations(rotations)) => {
                        (TrackProperty::Rotation, TrackValues::Quat(Arc::from(convert_rotations(rotations))))
                    }
                    (Property::MorphTargetWeights, _) => {
                        // Morph targets are not consumed by the playback stack.
                        continue;
                    }
                    _ => continue,
                };

                let track = KeyframeTrack::new(joint.as_str(), property, times, values)
                    .with_context(|| {
                        format!("Animation '{clip_name}' has an invalid channel (node {})", target_node.index())
                    })?;
                tracks.push(track);
            }

            if tracks.is_empty() {
                continue;
            }
            let clip = AnimationClip::from_tracks(clip_name, tracks)?;
            clips.push(Arc::new(filter_root_motion(&clip.optimized())));
        }

        Ok(ModelScene {
            name,
            meshes,
            materials,
            clips,
            scale: cfg.scale,
            position: Vec3::from_array(cfg.position),
        })
    }
}

fn convert_rotations(rotations: Rotations) -> Vec<Quat> {
    rotations
        .into_f32()
        .map(|components| {
            let quat = Quat::from_xyzw(components[0], components[1], components[2], components[3]);
            if quat.length_squared() > 0.0 {
                quat.normalize()
            } else {
                Quat::IDENTITY
            }
        })
        .collect()
}

fn model_name_from_url(url: &str) -> String {
    let file = url.rsplit('/').next().unwrap_or(url);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}
