//! The experience: composition root of cache, scene and renderer.
//!
//! An [`Experience`] is constructed explicitly and owned by the application.
//! Its lifecycle is:
//!
//! 1. [`Experience::init`] installs logging, sizes the viewport, populates the
//!    scene from [`ExperienceConfig::spawns`] and dispatches
//!    [`ExperienceEvent::Ready`]. A second call fails with
//!    [`ExperienceError::AlreadyInitialized`].
//! 2. [`Experience::frame`] is called once per animation frame; it measures the
//!    time since the previous frame, advances every scene instance and renders.
//! 3. [`Experience::teardown`] empties the scene and disposes the renderer, after
//!    which `init` may be called again.
//!
//! On native targets `init` and `spawn` have to run inside a tokio `LocalSet`,
//! since the model cache drives its loads as local tasks.

use std::rc::Rc;

use cgmath::Deg;
use instant::{Duration, Instant};

use crate::{
    cache::ModelCache,
    config::{ExperienceConfig, SpawnRequest},
    error::{ExperienceError, ModelCacheError},
    events::{EventBus, ExperienceEvent},
    render::{Frame, Projection, Renderer},
    resources::AssetLoader,
    scene::{InstanceId, Scene, SceneInstance},
};

pub struct Experience<R: Renderer> {
    config: ExperienceConfig,
    cache: Rc<ModelCache>,
    renderer: R,
    scene: Scene,
    projection: Projection,
    events: EventBus<ExperienceEvent>,
    last_frame: Option<Instant>,
    elapsed: Duration,
    initialized: bool,
}

impl<R: Renderer> Experience<R> {
    pub fn new(config: ExperienceConfig, loader: Rc<dyn AssetLoader>, renderer: R) -> Self {
        let cache = Rc::new(ModelCache::new(loader, config.cache.clone()));
        Self::with_cache(config, cache, renderer)
    }

    /// Builds an experience on top of a cache that is shared with other owners.
    pub fn with_cache(config: ExperienceConfig, cache: Rc<ModelCache>, renderer: R) -> Self {
        let projection = Projection::new(
            config.width,
            config.height,
            Deg(config.fovy_degrees),
            config.znear,
            config.zfar,
        );
        Self {
            config,
            cache,
            renderer,
            scene: Scene::new(),
            projection,
            events: EventBus::new(),
            last_frame: None,
            elapsed: Duration::ZERO,
            initialized: false,
        }
    }

    /// See the module docs. Instances that fail to load are logged and left out.
    pub async fn init(&mut self) -> Result<(), ExperienceError> {
        if self.initialized {
            return Err(ExperienceError::AlreadyInitialized);
        }
        self.initialized = true;
        init_logger();

        self.resize(self.config.width, self.config.height);
        self.populate().await;

        self.last_frame = Some(Instant::now());
        let listeners = self.events.dispatch(&ExperienceEvent::Ready);
        log::info!(
            "Experience ready with {} instances, notified {} listeners.",
            self.scene.len(),
            listeners
        );
        Ok(())
    }

    async fn populate(&mut self) {
        let loads = self.config.spawns.iter().map(|request| {
            let mut instance = self.instance_for(request);
            async move {
                let result = instance.load().await.map(|_| ());
                (instance, result)
            }
        });
        let loaded = futures::future::join_all(loads).await;
        for (instance, result) in loaded {
            match result {
                Ok(()) => {
                    self.scene.attach(instance);
                }
                Err(e) => log::error!("Leaving {} out of the scene: {}", instance.key(), e),
            }
        }
    }

    fn instance_for(&self, request: &SpawnRequest) -> SceneInstance {
        let instance = SceneInstance::new(Rc::clone(&self.cache), request.options.clone());
        match &request.default_action {
            Some(action) => instance.with_default_action(action.clone()),
            None => instance,
        }
    }

    /// Loads one more instance into the running scene.
    pub async fn spawn(&mut self, request: &SpawnRequest) -> Result<InstanceId, ModelCacheError> {
        self.instance_for(request).init(&mut self.scene).await
    }

    /// Advances by the wall-clock time since the previous frame.
    pub fn frame(&mut self) {
        let now = Instant::now();
        let delta = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_frame = Some(now);
        self.advance(delta);
    }

    /// Updates every instance by `delta` and renders one frame.
    ///
    /// Does nothing before `init`.
    pub fn advance(&mut self, delta: Duration) {
        if !self.initialized {
            return;
        }
        self.elapsed += delta;
        self.scene.update(delta.as_secs_f32());
        let frame = Frame {
            scene: &self.scene,
            projection: &self.projection,
            camera_position: self.config.camera_position,
            lights: &self.config.lights,
            instances: self.scene.render_instances(),
        };
        self.renderer.render(&frame);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.projection.resize(width, height);
            self.renderer.set_size(width, height);
        } else {
            log::warn!("Ignoring resize to {}x{}.", width, height);
        }
    }

    pub fn teardown(&mut self) {
        if !self.initialized {
            return;
        }
        self.scene.clear();
        self.renderer.dispose();
        self.last_frame = None;
        self.elapsed = Duration::ZERO;
        self.initialized = false;
        log::info!("Experience torn down.");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn cache(&self) -> &Rc<ModelCache> {
        &self.cache
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn events_mut(&mut self) -> &mut EventBus<ExperienceEvent> {
        &mut self.events
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }
}
