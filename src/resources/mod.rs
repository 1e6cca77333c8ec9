use std::{collections::HashMap, rc::Rc};

use base64::Engine;
use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    config::LoaderConfig,
    data_structures::{
        instance::Instance,
        scene_graph::{MeshData, NodeId, SceneFragment},
    },
    error::AssetLoadError,
    resources::animation::{AnimationClip, Interpolation, Keyframes, Track},
};

/**
 * This module contains all logic for loading models and their animations from external files.
 */
pub mod animation;
pub mod file;

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// A freshly decoded model: its node hierarchy plus every animation clip.
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    pub fragment: SceneFragment,
    pub clips: Vec<AnimationClip>,
}

/// Decodes a model from a url.
///
/// Implementations own no cache; every call performs a full load. The
/// [`ModelCache`](crate::cache::ModelCache) makes sure this happens at most once per asset.
pub trait AssetLoader {
    fn load_asset<'a>(
        &'a self,
        url: &'a str,
    ) -> LocalBoxFuture<'a, Result<LoadedAsset, AssetLoadError>>;
}

/// Loads `.gltf` and `.glb` scenes from disk (native) or over http (wasm).
#[derive(Clone, Debug, Default)]
pub struct GltfLoader {
    config: LoaderConfig,
}

impl GltfLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>, AssetLoadError> {
        file::load_binary(&self.config.asset_root, url)
            .await
            .map_err(|source| AssetLoadError::Read {
                url: url.to_string(),
                source,
            })
    }

    async fn load_buffers(
        &self,
        url: &str,
        gltf: &gltf::Gltf,
    ) -> Result<Vec<Vec<u8>>, AssetLoadError> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => {
                    gltf.blob
                        .clone()
                        .ok_or_else(|| AssetLoadError::MissingBuffer {
                            url: url.to_string(),
                            index: buffer.index(),
                        })?
                }
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    decode_data_uri(url, uri)?
                }
                gltf::buffer::Source::Uri(uri) => {
                    self.read(&file::resolve_relative(url, uri)).await?
                }
            };
            if data.len() < buffer.length() {
                return Err(AssetLoadError::MissingBuffer {
                    url: url.to_string(),
                    index: buffer.index(),
                });
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    pub async fn load_model_gltf(&self, url: &str) -> Result<LoadedAsset, AssetLoadError> {
        let bytes = self.read(url).await?;
        let gltf = gltf::Gltf::from_slice(&bytes).map_err(|source| AssetLoadError::Parse {
            url: url.to_string(),
            source,
        })?;
        if gltf.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
            return Err(AssetLoadError::Unsupported {
                url: url.to_string(),
                reason: format!("{} is required but not available", DRACO_EXTENSION),
            });
        }
        let buffer_data = self.load_buffers(url, &gltf).await?;

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| AssetLoadError::Unsupported {
                url: url.to_string(),
                reason: "document contains no scene".to_string(),
            })?;

        let mut fragment = SceneFragment::new();
        let mut node_ids: HashMap<usize, NodeId> = HashMap::new();
        for node in scene.nodes() {
            add_node(
                &mut fragment,
                SceneFragment::ROOT,
                node,
                &buffer_data,
                &mut node_ids,
            );
        }
        fragment.update_world_transforms();

        let clips = gltf
            .animations()
            .map(|animation| to_clip(animation, &buffer_data, &node_ids))
            .collect::<Vec<_>>();

        log::debug!(
            "Decoded {}: {} nodes, {} clips.",
            url,
            fragment.len(),
            clips.len()
        );
        Ok(LoadedAsset { fragment, clips })
    }
}

impl AssetLoader for GltfLoader {
    fn load_asset<'a>(
        &'a self,
        url: &'a str,
    ) -> LocalBoxFuture<'a, Result<LoadedAsset, AssetLoadError>> {
        self.load_model_gltf(url).boxed_local()
    }
}

fn decode_data_uri(url: &str, uri: &str) -> Result<Vec<u8>, AssetLoadError> {
    let payload = uri
        .split_once(";base64,")
        .map(|(_, data)| data)
        .ok_or_else(|| AssetLoadError::Unsupported {
            url: url.to_string(),
            reason: "only base64 data uris are supported".to_string(),
        })?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|source| AssetLoadError::DataUri {
            url: url.to_string(),
            source,
        })
}

fn add_node(
    fragment: &mut SceneFragment,
    parent: NodeId,
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    node_ids: &mut HashMap<usize, NodeId>,
) {
    let (translation, [x, y, z, w], scale) = node.transform().decomposed();
    let local = Instance {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(w, x, y, z),
        scale: scale.into(),
    };
    let id = fragment.add_node(parent, node.name().map(String::from), local);
    node_ids.insert(node.index(), id);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|it| it.collect())
                .unwrap_or_default();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|it| it.collect())
                .unwrap_or_default();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|it| it.into_u32().collect())
                .unwrap_or_default();
            let name = mesh.name().unwrap_or("unknown_mesh");
            fragment.add_mesh(
                id,
                Rc::new(MeshData::new(
                    name,
                    positions,
                    normals,
                    indices,
                    primitive.material().index(),
                )),
            );
        }
    }

    for child in node.children() {
        add_node(fragment, id, child, buffers, node_ids);
    }
}

fn to_clip(
    animation: gltf::Animation,
    buffers: &[Vec<u8>],
    node_ids: &HashMap<usize, NodeId>,
) -> AnimationClip {
    let name = animation.name().unwrap_or("Default").to_string();
    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let target_index = channel.target().node().index();
        let Some(&target) = node_ids.get(&target_index) else {
            log::warn!(
                "Animation {} targets node {} outside the loaded scene, skipping channel {}.",
                name,
                target_index,
                channel.index()
            );
            continue;
        };
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let timestamps: Vec<f32> = match reader.read_inputs() {
            Some(inputs) => inputs.collect(),
            None => {
                log::warn!("No timestamps found in channel {} of {}.", channel.index(), name);
                continue;
            }
        };
        // Cubic spline outputs are (in-tangent, value, out-tangent) triples; keep the values.
        let (interpolation, stride, offset) = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => (Interpolation::Step, 1, 0),
            gltf::animation::Interpolation::Linear => (Interpolation::Linear, 1, 0),
            gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, 3, 1),
        };
        let keyframes = match reader.read_outputs() {
            Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                Keyframes::Translation(
                    translations
                        .skip(offset)
                        .step_by(stride)
                        .map(cgmath::Vector3::from)
                        .collect(),
                )
            }
            Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
                rotations
                    .into_f32()
                    .skip(offset)
                    .step_by(stride)
                    .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                    .collect(),
            ),
            Some(gltf::animation::util::ReadOutputs::Scales(scales)) => Keyframes::Scale(
                scales
                    .skip(offset)
                    .step_by(stride)
                    .map(cgmath::Vector3::from)
                    .collect(),
            ),
            Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
                log::warn!("Morph target animation in {} is not supported, skipping.", name);
                continue;
            }
            None => {
                log::warn!("No keyframes found in channel {} of {}.", channel.index(), name);
                continue;
            }
        };
        tracks.push(Track {
            target,
            interpolation,
            timestamps,
            keyframes,
        });
    }
    AnimationClip::new(name, tracks)
}
