//! scene-ngin
//!
//! The model resource and scene-object layer of a small 3D experience. Heavy
//! glTF models are decoded once, kept in a shared cache and handed out as cheap
//! copies that share geometry but own their node hierarchy, transform and
//! animation playback state.
//!
//! Everything runs on a single thread; the only suspension points are model
//! loads. The cache coalesces concurrent requests for the same model into a
//! single load.
//!
//! High-level modules
//! - `cache`: the single-flight model cache
//! - `scene`: scene instances, per-type defaults and the scene root
//! - `animation`: per-instance animation playback
//! - `data_structures`: asset keys, transforms and scene graph fragments
//! - `resources`: the asset loader contract and the glTF loader
//! - `experience`: the composition root driving the frame loop
//! - `events`: named ready notifications
//! - `render`: the narrow renderer seam
//! - `config` and `error`: configuration and error types
//!

pub mod animation;
pub mod cache;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod events;
pub mod experience;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cache::{ModelCache, ModelHandle, Provenance};
pub use cgmath;
pub use data_structures::asset_key::{AssetKey, ModelCategory, ModelFormat, SpawnOptions};
pub use error::{AssetLoadError, ExperienceError, ModelCacheError};
pub use experience::Experience;
pub use scene::{Scene, SceneInstance};
