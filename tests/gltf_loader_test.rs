use std::{collections::HashSet, rc::Rc};

use scene_ngin::{
    AssetKey, ModelCache, ModelCacheError, ModelCategory, ModelFormat, Scene, SceneInstance,
    SpawnOptions,
    config::{CacheConfig, LoaderConfig},
    error::AssetLoadError,
    resources::{AssetLoader, GltfLoader},
    scene::{Car, SceneObject},
};

use crate::common::test_utils::{fixture_root, run_local};

mod common;

fn loader() -> GltfLoader {
    GltfLoader::new(LoaderConfig {
        asset_root: fixture_root(),
    })
}

fn cache() -> Rc<ModelCache> {
    Rc::new(ModelCache::new(Rc::new(loader()), CacheConfig::default()))
}

#[test]
fn decodes_nodes_meshes_and_clips() {
    run_local(async {
        let url = Car::KEY.url(ModelFormat::Gltf);
        let asset = loader().load_asset(&url).await.expect("fixture loads");

        let fragment = &asset.fragment;
        let car = fragment.find("Car").expect("car node");
        let body = fragment.find("Body").expect("body node");
        assert_eq!(fragment.node(body).and_then(|n| n.parent()), Some(car));
        assert_eq!(fragment.node(body).map(|n| n.meshes().len()), Some(1));
        assert_eq!(
            fragment.node(car).map(|n| n.local_transform().position),
            Some(cgmath::Vector3::new(0.0, 0.5, 0.0))
        );

        let names: Vec<&str> = asset.clips.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Idle", "Walk", "TPose"]);
        let walk = &asset.clips[1];
        assert!((walk.duration() - 1.0).abs() < 1e-6);
        assert_eq!(walk.tracks[0].target, car);

        let dims = fragment.dimensions();
        assert!((dims.width - 1.0).abs() < 1e-5);
        assert!((dims.height - 1.0).abs() < 1e-5);
        assert!((dims.depth - 2.0).abs() < 1e-5);
    });
}

#[test]
fn missing_file_is_a_read_error() {
    run_local(async {
        let url = AssetKey::new(ModelCategory::Enemy, 3).url(ModelFormat::Gltf);
        let err = loader().load_asset(&url).await.unwrap_err();
        assert!(matches!(err, AssetLoadError::Read { url: ref u, .. } if *u == url));
    });
}

#[test]
fn fixture_car_through_the_cache() {
    run_local(async {
        let cache = cache();
        let mut scene = Scene::new();

        let id = SceneInstance::make::<Car>(Rc::clone(&cache), &mut scene)
            .await
            .expect("car");
        let car = scene.get(id).expect("attached");

        let actions: HashSet<&str> = car.action_names().collect();
        assert_eq!(actions, HashSet::from(["Idle", "Walk"]));
        assert!(cache.contains(&Car::KEY));

        let moved =
            SpawnOptions::new(Car::KEY).with_position(cgmath::Vector3::new(3.0, 0.0, 0.0));
        let handle = cache.get(&moved).await.expect("cached");
        let bounds = handle.fragment.bounding().expect("has geometry");
        assert!((bounds.min.x - 2.5).abs() < 1e-5);
        assert!((bounds.max.y - 1.0).abs() < 1e-5);
    });
}

#[test]
fn missing_model_fails_through_the_cache() {
    run_local(async {
        let cache = cache();
        let key = AssetKey::new(ModelCategory::Prop, 12);

        let err = cache.get(&SpawnOptions::new(key)).await.unwrap_err();

        assert_eq!(err, ModelCacheError::LoadFailed { key });
        assert!(!cache.contains(&key));
    });
}
