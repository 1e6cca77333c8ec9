//! Model cache with single-flight loading.
//!
//! The cache maps an [`AssetKey`] either to a load that is still in flight or to
//! the decoded model. A miss inserts the in-flight load *before* it is first
//! polled, so every concurrent request for the same key awaits that one load
//! instead of starting its own. On success the slot is replaced by the decoded
//! entry; on failure the slot is removed so that the next request retries.
//!
//! Every load is also spawned as a local task, so a request that is dropped
//! half way still fills the cache.
//!
//! Stored entries are transform-agnostic: their root carries the identity
//! transform and spawn transforms are only ever applied to the copies handed
//! out by [`ModelCache::get`].

use std::{
    cell::RefCell,
    collections::HashMap,
    num::NonZeroUsize,
    rc::{Rc, Weak},
};

use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared},
};

use crate::{
    config::CacheConfig,
    data_structures::{
        asset_key::{AssetKey, SpawnOptions},
        instance::Instance,
        scene_graph::SceneFragment,
    },
    error::ModelCacheError,
    resources::{AssetLoader, LoadedAsset, animation::AnimationClip},
};

/// How a [`ModelHandle`] was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// This request started the load.
    Loaded,
    /// This request joined a load started by another request.
    Coalesced,
    /// The model was already resident.
    Cached,
}

/// A placed copy of a cached model.
///
/// The fragment is owned by the caller; its geometry is shared with the cache.
#[derive(Debug)]
pub struct ModelHandle {
    pub fragment: SceneFragment,
    pub clips: Vec<Rc<AnimationClip>>,
    pub provenance: Provenance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Loader invocations.
    pub loads: usize,
    pub hits: usize,
    pub coalesced: usize,
    pub failures: usize,
    pub evictions: usize,
}

/// A decoded model as stored in the cache. Never mutated after insertion.
#[derive(Debug)]
struct CacheEntry {
    fragment: SceneFragment,
    clips: Vec<Rc<AnimationClip>>,
}

impl CacheEntry {
    fn new(asset: LoadedAsset) -> Self {
        let mut fragment = asset.fragment;
        fragment.set_transform(Instance::new());
        fragment.update_world_transforms();
        Self {
            fragment,
            clips: asset.clips.into_iter().map(Rc::new).collect(),
        }
    }

    fn instantiate(&self, options: &SpawnOptions, provenance: Provenance) -> ModelHandle {
        let mut fragment = self.fragment.clone();
        fragment.set_transform(options.transform());
        fragment.update_world_transforms();
        ModelHandle {
            fragment,
            clips: self.clips.clone(),
            provenance,
        }
    }
}

type LoadResult = Result<Rc<CacheEntry>, ModelCacheError>;
type PendingLoad = Shared<LocalBoxFuture<'static, LoadResult>>;

enum Slot {
    Loading(PendingLoad),
    Ready { entry: Rc<CacheEntry>, last_used: u64 },
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<AssetKey, Slot>,
    clock: u64,
    stats: CacheStats,
}

impl CacheState {
    fn ready_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    /// Drops least recently used entries until at most `capacity` are resident.
    /// In-flight loads and `keep` are never dropped.
    fn evict_over(&mut self, capacity: Option<NonZeroUsize>, keep: AssetKey) {
        let Some(capacity) = capacity else {
            return;
        };
        let mut resident = self.ready_count();
        while resident > capacity.get() {
            let victim = self
                .slots
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready { last_used, .. } if *key != keep => Some((*key, *last_used)),
                    _ => None,
                })
                .min_by_key(|(_, last_used)| *last_used)
                .map(|(key, _)| key);
            let Some(victim) = victim else {
                break;
            };
            self.slots.remove(&victim);
            resident -= 1;
            self.stats.evictions += 1;
            log::debug!("Evicted model {} from the cache.", victim);
        }
    }
}

/// Polls a load on the local executor until it settles, so that the cache is
/// populated even when every caller dropped its request.
fn drive_to_completion(pending: PendingLoad) {
    let driver = async move {
        let _ = pending.await;
    };
    #[cfg(not(target_arch = "wasm32"))]
    {
        drop(tokio::task::spawn_local(driver));
    }
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(driver);
    }
}

/// Shared model store. See the module docs.
///
/// On native targets the cache must be used from within a tokio `LocalSet`;
/// loads are driven there as local tasks.
///
/// Meant to be created once by the composition root and handed to every
/// [`SceneInstance`](crate::scene::SceneInstance) as an `Rc<ModelCache>`.
pub struct ModelCache {
    loader: Rc<dyn AssetLoader>,
    config: CacheConfig,
    state: Rc<RefCell<CacheState>>,
}

impl ModelCache {
    pub fn new(loader: Rc<dyn AssetLoader>, config: CacheConfig) -> Self {
        Self {
            loader,
            config,
            state: Rc::new(RefCell::new(CacheState::default())),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /**
     * Returns a placed copy of the model named by `options.key`.
     *
     * Every call yields a fragment of its own with `options`' position, rotation
     * and scale applied to the root and world transforms already computed. The
     * loader runs at most once per key while the key is resident or loading.
     *
     * A failed load is logged here and reported as [`ModelCacheError::LoadFailed`]
     * to every caller that waited on it.
     */
    pub async fn get(&self, options: &SpawnOptions) -> Result<ModelHandle, ModelCacheError> {
        let key = options.key;
        let (pending, provenance) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state.clock += 1;
            let now = state.clock;
            match state.slots.get_mut(&key) {
                Some(Slot::Ready { entry, last_used }) => {
                    *last_used = now;
                    let entry = Rc::clone(entry);
                    state.stats.hits += 1;
                    log::debug!("Cache hit for model {}.", key);
                    return Ok(entry.instantiate(options, Provenance::Cached));
                }
                Some(Slot::Loading(pending)) => {
                    let pending = pending.clone();
                    state.stats.coalesced += 1;
                    log::debug!("Model {} is already loading, waiting for it.", key);
                    (pending, Provenance::Coalesced)
                }
                None => {
                    let pending = self.start_load(key);
                    state.slots.insert(key, Slot::Loading(pending.clone()));
                    state.stats.loads += 1;
                    drive_to_completion(pending.clone());
                    (pending, Provenance::Loaded)
                }
            }
        };
        let entry = pending.await?;
        Ok(entry.instantiate(options, provenance))
    }

    /// Builds the shared load for `key`. Nothing runs until the first poll.
    fn start_load(&self, key: AssetKey) -> PendingLoad {
        let loader = Rc::clone(&self.loader);
        let state: Weak<RefCell<CacheState>> = Rc::downgrade(&self.state);
        let capacity = self.config.capacity;
        let url = key.url(self.config.format);
        async move {
            log::info!("Loading model {} from {}.", key, url);
            let outcome = match loader.load_asset(&url).await {
                Ok(asset) => Ok(Rc::new(CacheEntry::new(asset))),
                Err(err) => {
                    log::error!("Failed to load model {} from {}: {}", key, url, err);
                    Err(ModelCacheError::LoadFailed { key })
                }
            };
            if let Some(state) = state.upgrade() {
                let mut guard = state.borrow_mut();
                let state = &mut *guard;
                match &outcome {
                    Ok(entry) => {
                        state.clock += 1;
                        let last_used = state.clock;
                        state.slots.insert(
                            key,
                            Slot::Ready {
                                entry: Rc::clone(entry),
                                last_used,
                            },
                        );
                        state.evict_over(capacity, key);
                    }
                    Err(_) => {
                        state.slots.remove(&key);
                        state.stats.failures += 1;
                    }
                }
            }
            outcome
        }
        .boxed_local()
        .shared()
    }

    /// True if the model is resident (not merely loading).
    pub fn contains(&self, key: &AssetKey) -> bool {
        matches!(
            self.state.borrow().slots.get(key),
            Some(Slot::Ready { .. })
        )
    }

    pub fn is_loading(&self, key: &AssetKey) -> bool {
        matches!(self.state.borrow().slots.get(key), Some(Slot::Loading(_)))
    }

    /// Number of resident models.
    pub fn len(&self) -> usize {
        self.state.borrow().ready_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.state.borrow().stats
    }

    /// Drops a resident model. Returns false if it was not resident.
    ///
    /// Copies already handed out keep their shared geometry alive.
    pub fn evict(&self, key: &AssetKey) -> bool {
        let mut state = self.state.borrow_mut();
        if matches!(state.slots.get(key), Some(Slot::Ready { .. })) {
            state.slots.remove(key);
            state.stats.evictions += 1;
            true
        } else {
            false
        }
    }

    /// Drops every resident model; loads in flight are kept.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        let before = state.slots.len();
        state
            .slots
            .retain(|_, slot| matches!(slot, Slot::Loading(_)));
        let dropped = before - state.slots.len();
        state.stats.evictions += dropped;
    }
}
