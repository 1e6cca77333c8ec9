use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    future::Future,
    path::PathBuf,
    rc::Rc,
};

use futures::{FutureExt, future::LocalBoxFuture};
use scene_ngin::{
    AssetKey, ModelCache, ModelFormat,
    config::CacheConfig,
    data_structures::{
        instance::Instance,
        scene_graph::{MeshData, SceneFragment},
    },
    error::AssetLoadError,
    resources::{
        AssetLoader, LoadedAsset,
        animation::{AnimationClip, Interpolation, Keyframes, Track},
    },
};

/// Loader double: serves prepared assets, counts calls per url and fails on demand.
///
/// Every load yields once before resolving so that concurrent requests overlap.
pub(crate) struct MockLoader {
    assets: HashMap<String, LoadedAsset>,
    failing: RefCell<HashSet<String>>,
    calls: RefCell<HashMap<String, usize>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            failing: RefCell::new(HashSet::new()),
            calls: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_asset(mut self, key: AssetKey, asset: LoadedAsset) -> Self {
        self.assets.insert(key.url(ModelFormat::Gltf), asset);
        self
    }

    pub fn fail(&self, key: AssetKey) {
        self.failing.borrow_mut().insert(key.url(ModelFormat::Gltf));
    }

    pub fn recover(&self, key: AssetKey) {
        self.failing.borrow_mut().remove(&key.url(ModelFormat::Gltf));
    }

    pub fn calls(&self, key: AssetKey) -> usize {
        self.calls
            .borrow()
            .get(&key.url(ModelFormat::Gltf))
            .copied()
            .unwrap_or(0)
    }
}

impl AssetLoader for MockLoader {
    fn load_asset<'a>(
        &'a self,
        url: &'a str,
    ) -> LocalBoxFuture<'a, Result<LoadedAsset, AssetLoadError>> {
        async move {
            *self.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
            tokio::task::yield_now().await;
            if self.failing.borrow().contains(url) {
                return Err(AssetLoadError::Read {
                    url: url.to_string(),
                    source: anyhow::anyhow!("network error: connection reset"),
                });
            }
            self.assets
                .get(url)
                .cloned()
                .ok_or_else(|| AssetLoadError::Read {
                    url: url.to_string(),
                    source: anyhow::anyhow!("404 not found"),
                })
        }
        .boxed_local()
    }
}

/// A model with one 1x2x1 box node and one translation clip per name.
pub(crate) fn boxed_model(clip_names: &[&str]) -> LoadedAsset {
    let mut fragment = SceneFragment::new();
    let body = fragment.add_node(SceneFragment::ROOT, Some("body".into()), Instance::new());
    fragment.add_mesh(
        body,
        Rc::new(MeshData::new(
            "box",
            vec![[-0.5, 0.0, -0.5], [0.5, 2.0, 0.5]],
            Vec::new(),
            vec![0, 1, 0],
            None,
        )),
    );
    fragment.update_world_transforms();

    let clips = clip_names
        .iter()
        .map(|name| {
            AnimationClip::new(
                *name,
                vec![Track {
                    target: body,
                    interpolation: Interpolation::Linear,
                    timestamps: vec![0.0, 1.0],
                    keyframes: Keyframes::Translation(vec![
                        cgmath::Vector3::new(0.0, 0.0, 0.0),
                        cgmath::Vector3::new(0.0, 1.0, 0.0),
                    ]),
                }],
            )
        })
        .collect();

    LoadedAsset { fragment, clips }
}

pub(crate) fn cache_with(loader: &Rc<MockLoader>, config: CacheConfig) -> Rc<ModelCache> {
    Rc::new(ModelCache::new(loader.clone(), config))
}

pub(crate) fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Runs `future` on a current-thread runtime inside a `LocalSet`, where the
/// cache spawns its loads.
pub(crate) fn run_local<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime");
    tokio::task::LocalSet::new().block_on(&runtime, future)
}
