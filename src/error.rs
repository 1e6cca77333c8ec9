//! Error taxonomy.
//!
//! Loader failures stay detailed ([`AssetLoadError`]) but never cross the cache
//! boundary: the cache logs them and hands its callers a [`ModelCacheError`]
//! that only names the asset.

use thiserror::Error;

use crate::data_structures::asset_key::AssetKey;

/// Failure while fetching or decoding a model asset.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("could not read {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not parse glTF document {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: gltf::Error,
    },
    #[error("malformed data uri in {url}: {source}")]
    DataUri {
        url: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("buffer {index} of {url} has no data")]
    MissingBuffer { url: String, index: usize },
    #[error("{url} is not supported: {reason}")]
    Unsupported { url: String, reason: String },
}

/// Normalized error handed to cache callers.
///
/// Cloned to every caller that waited on the same in-flight load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelCacheError {
    #[error("model load failed for {key}")]
    LoadFailed { key: AssetKey },
}

#[derive(Debug, Error)]
pub enum ExperienceError {
    #[error("experience is already initialized")]
    AlreadyInitialized,
}
