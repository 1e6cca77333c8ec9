//! Configuration handed in by the composition root.

use std::{num::NonZeroUsize, path::PathBuf};

use crate::{
    data_structures::asset_key::{ModelFormat, SpawnOptions},
    render::{Light, LightKind},
};

/// Environment variable overriding [`LoaderConfig::asset_root`].
pub const ASSET_ROOT_ENV: &str = "SCENE_NGIN_ASSET_ROOT";

#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Maximum number of loaded models kept resident. `None` never evicts.
    pub capacity: Option<NonZeroUsize>,
    pub format: ModelFormat,
}

#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Directory the `/assets/...` urls are resolved against on native targets.
    pub asset_root: PathBuf,
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        match std::env::var_os(ASSET_ROOT_ENV) {
            Some(root) => Self {
                asset_root: PathBuf::from(root),
            },
            None => Self::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./"),
        }
    }
}

/// One model the experience places while populating its scene.
#[derive(Clone, Debug)]
pub struct SpawnRequest {
    pub options: SpawnOptions,
    pub default_action: Option<String>,
}

impl SpawnRequest {
    pub fn new(options: impl Into<SpawnOptions>) -> Self {
        Self {
            options: options.into(),
            default_action: None,
        }
    }

    pub fn with_default_action(mut self, action: impl Into<String>) -> Self {
        self.default_action = Some(action.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct ExperienceConfig {
    pub width: u32,
    pub height: u32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub camera_position: cgmath::Point3<f32>,
    pub lights: Vec<Light>,
    pub spawns: Vec<SpawnRequest>,
    pub cache: CacheConfig,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fovy_degrees: 65.0,
            znear: 0.1,
            zfar: 2000.0,
            camera_position: cgmath::Point3::new(0.0, 0.5, 3.0),
            lights: vec![
                Light {
                    kind: LightKind::Ambient,
                    colour: [1.0, 1.0, 1.0],
                    intensity: 4.5,
                    cast_shadow: false,
                },
                Light {
                    kind: LightKind::Directional,
                    colour: [1.0, 1.0, 1.0],
                    intensity: 1.0,
                    cast_shadow: true,
                },
            ],
            spawns: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}
