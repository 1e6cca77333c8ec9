//! Scene instances and the scene root they are attached to.
//!
//! A [`SceneInstance`] is one spawned model: its own copy of the model's node
//! hierarchy, an [`AnimationMixer`] bound to that copy and a name to action
//! table built from the model's clips. The [`Scene`] owns attached instances
//! and advances all of them once per frame.

use std::{collections::BTreeMap, collections::HashMap, rc::Rc};

use crate::{
    animation::{ActionId, AnimationMixer},
    cache::ModelCache,
    data_structures::{
        asset_key::{AssetKey, ModelCategory, SpawnOptions},
        instance::{Instance, InstanceRaw},
        scene_graph::{Aabb, Dimensions, SceneFragment},
    },
    error::ModelCacheError,
};

/// Clip names with a fixed meaning.
pub mod animation_names {
    /// The rest pose clip. Never becomes a playable action.
    pub const REST_POSE: &str = "TPose";
    pub const IDLE: &str = "Idle";
    pub const CAR: &str = "Car";
}

/// Compile-time description of a kind of scene object.
pub trait SceneObject {
    const KEY: AssetKey;
    /// The action started as soon as an instance joins a scene.
    const DEFAULT_ACTION: Option<&'static str>;

    fn spawn_options() -> SpawnOptions {
        SpawnOptions::new(Self::KEY)
    }
}

pub struct Car;

impl SceneObject for Car {
    const KEY: AssetKey = AssetKey::new(ModelCategory::Car, 1);
    const DEFAULT_ACTION: Option<&'static str> = Some(animation_names::CAR);
}

pub struct SceneInstance {
    cache: Rc<ModelCache>,
    options: SpawnOptions,
    default_action: Option<String>,
    fragment: Option<SceneFragment>,
    mixer: AnimationMixer,
    actions: HashMap<String, ActionId>,
}

impl SceneInstance {
    pub fn new(cache: Rc<ModelCache>, options: SpawnOptions) -> Self {
        Self {
            cache,
            options,
            default_action: None,
            fragment: None,
            mixer: AnimationMixer::new(),
            actions: HashMap::new(),
        }
    }

    pub fn with_default_action(mut self, action: impl Into<String>) -> Self {
        self.default_action = Some(action.into());
        self
    }

    /// An instance of `T` with `T`'s key and default action.
    pub fn of<T: SceneObject>(cache: Rc<ModelCache>) -> Self {
        let mut instance = Self::new(cache, T::spawn_options());
        instance.default_action = T::DEFAULT_ACTION.map(String::from);
        instance
    }

    /// Creates an instance of `T` and attaches it to `scene`.
    pub async fn make<T: SceneObject>(
        cache: Rc<ModelCache>,
        scene: &mut Scene,
    ) -> Result<InstanceId, ModelCacheError> {
        Self::of::<T>(cache).init(scene).await
    }

    /**
     * Fetches the model from the cache and binds its animations.
     *
     * The rest pose clip is left out of the action table; every other clip is
     * bound under its exact name, stopped. Cache errors are returned unchanged.
     */
    pub async fn load(&mut self) -> Result<&SceneFragment, ModelCacheError> {
        let handle = self.cache.get(&self.options).await?;
        let fragment = handle.fragment;

        let mut mixer = AnimationMixer::new();
        let mut actions = HashMap::new();
        for clip in handle
            .clips
            .into_iter()
            .filter(|clip| clip.name != animation_names::REST_POSE)
        {
            let name = clip.name.clone();
            let action = mixer.clip_action(clip, &fragment);
            actions.insert(name, action);
        }

        self.mixer = mixer;
        self.actions = actions;
        let fragment: &SceneFragment = self.fragment.insert(fragment);
        Ok(fragment)
    }

    /// Loads the model, adds the instance to `scene` and starts its default action.
    pub async fn init(mut self, scene: &mut Scene) -> Result<InstanceId, ModelCacheError> {
        self.load().await?;
        Ok(scene.attach(self))
    }

    /// Starts the default action if the model has a clip of that name.
    fn play_default(&mut self) {
        let Some(name) = self.default_action.clone() else {
            return;
        };
        if !self.play(&name) {
            log::debug!(
                "Model {} has no action {} to start.",
                self.options.key,
                name
            );
        }
    }

    /// Advances animation by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        if let Some(fragment) = self.fragment.as_mut() {
            self.mixer.update(delta, fragment);
        }
    }

    /// Starts the named action. Returns false if there is no such action.
    pub fn play(&mut self, name: &str) -> bool {
        match self.actions.get(name) {
            Some(&id) => {
                self.mixer.play(id);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self, name: &str) -> bool {
        match self.actions.get(name) {
            Some(&id) => {
                self.mixer.stop(id);
                true
            }
            None => false,
        }
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.actions
            .get(name)
            .is_some_and(|&id| self.mixer.is_playing(id))
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn mixer_mut(&mut self) -> &mut AnimationMixer {
        &mut self.mixer
    }

    pub fn key(&self) -> AssetKey {
        self.options.key
    }

    pub fn fragment(&self) -> Option<&SceneFragment> {
        self.fragment.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.fragment.is_some()
    }

    /// Current root transform; the spawn transform until it is moved.
    pub fn transform(&self) -> Instance {
        self.fragment
            .as_ref()
            .map(|fragment| *fragment.transform())
            .unwrap_or_else(|| self.options.transform())
    }

    pub fn set_position(&mut self, position: cgmath::Vector3<f32>) {
        self.options.position = position;
        if let Some(fragment) = self.fragment.as_mut() {
            fragment.set_position(position);
            fragment.update_world_transforms();
        }
    }

    pub fn set_rotation(&mut self, rotation: cgmath::Quaternion<f32>) {
        self.options.rotation = rotation;
        if let Some(fragment) = self.fragment.as_mut() {
            fragment.set_rotation(rotation);
            fragment.update_world_transforms();
        }
    }

    pub fn set_scale(&mut self, scale: cgmath::Vector3<f32>) {
        self.options.scale = scale;
        if let Some(fragment) = self.fragment.as_mut() {
            fragment.set_scale(scale);
            fragment.update_world_transforms();
        }
    }

    /// World-space size of the model, zero before it is loaded.
    pub fn dimensions(&self) -> Dimensions {
        self.fragment
            .as_ref()
            .map(SceneFragment::dimensions)
            .unwrap_or_default()
    }
}

/// Handle of an instance attached to a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

/// The scene root. Owns every attached instance.
#[derive(Default)]
pub struct Scene {
    instances: BTreeMap<InstanceId, SceneInstance>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a loaded instance and starts its default action.
    pub fn attach(&mut self, mut instance: SceneInstance) -> InstanceId {
        if !instance.is_loaded() {
            log::warn!(
                "Attaching model {} before it was loaded, it will stay empty.",
                instance.key()
            );
        }
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        instance.play_default();
        self.instances.insert(id, instance);
        id
    }

    /// Detaches an instance and hands it back.
    pub fn remove(&mut self, id: InstanceId) -> Option<SceneInstance> {
        self.instances.remove(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&SceneInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut SceneInstance> {
        self.instances.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &SceneInstance)> {
        self.instances.iter().map(|(id, instance)| (*id, instance))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Advances every attached instance by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        self.instances
            .values_mut()
            .for_each(|instance| instance.update(delta));
    }

    /// World-space bounds of everything in the scene.
    pub fn bounding(&self) -> Option<Aabb> {
        self.instances
            .values()
            .filter_map(|instance| instance.fragment().and_then(SceneFragment::bounding))
            .reduce(|acc, b| acc.merge(&b))
    }

    /// Per-instance data of every mesh-bearing node, ready for an instance buffer.
    pub fn render_instances(&self) -> Vec<InstanceRaw> {
        self.instances
            .values()
            .filter_map(SceneInstance::fragment)
            .flat_map(|fragment| fragment.to_raw_instances())
            .collect()
    }
}
