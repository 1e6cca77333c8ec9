//! Asset identity and spawn parameters.

use std::fmt;

use cgmath::One;

use crate::data_structures::instance::Instance;

/// Folder a model lives in under `/assets/models/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelCategory {
    Car,
    Player,
    Enemy,
    Prop,
}

impl ModelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelCategory::Car => "car",
            ModelCategory::Player => "player",
            ModelCategory::Enemy => "enemy",
            ModelCategory::Prop => "prop",
        }
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk encoding of a model's scene file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelFormat {
    #[default]
    Gltf,
    Glb,
}

impl ModelFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ModelFormat::Gltf => "gltf",
            ModelFormat::Glb => "glb",
        }
    }
}

/// Identifies one loadable model. Compared structurally, so two categories can
/// never collide on the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub category: ModelCategory,
    pub id: u32,
}

impl AssetKey {
    pub const fn new(category: ModelCategory, id: u32) -> Self {
        Self { category, id }
    }

    /// The only path a key may resolve to. Callers never hand in their own paths.
    pub fn url(&self, format: ModelFormat) -> String {
        format!(
            "/assets/models/{}/{}/scene.{}",
            self.category,
            self.id,
            format.extension()
        )
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.id)
    }
}

/// Everything needed to request a placed copy of a model.
#[derive(Clone, Debug)]
pub struct SpawnOptions {
    pub key: AssetKey,
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl SpawnOptions {
    /// Spawn at the origin with identity rotation and unit scale.
    pub fn new(key: AssetKey) -> Self {
        Self {
            key,
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_position(mut self, position: cgmath::Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: cgmath::Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: cgmath::Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn transform(&self) -> Instance {
        Instance {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

impl From<AssetKey> for SpawnOptions {
    fn from(key: AssetKey) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_follows_the_asset_layout() {
        let key = AssetKey::new(ModelCategory::Enemy, 99);
        assert_eq!(key.url(ModelFormat::Gltf), "/assets/models/enemy/99/scene.gltf");
        assert_eq!(key.url(ModelFormat::Glb), "/assets/models/enemy/99/scene.glb");
    }

    #[test]
    fn keys_differ_across_categories() {
        let car = AssetKey::new(ModelCategory::Car, 1);
        let player = AssetKey::new(ModelCategory::Player, 1);
        assert_ne!(car, player);
        assert_ne!(car.to_string(), player.to_string());
    }
}
