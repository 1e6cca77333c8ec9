//! Engine data structures: asset keys, transforms and scene graphs.
//!
//! - `asset_key` names loadable models and carries spawn parameters
//! - `instance` holds per-node transformation data
//! - `scene_graph` is the node hierarchy of one model with shared geometry

pub mod asset_key;
pub mod instance;
pub mod scene_graph;
