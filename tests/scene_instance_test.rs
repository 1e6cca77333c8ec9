use std::{collections::HashSet, rc::Rc};

use scene_ngin::{
    AssetKey, ModelCacheError, ModelCategory, Scene, SceneInstance, SpawnOptions,
    config::CacheConfig,
    scene::{Car, SceneObject, animation_names},
};

use crate::common::test_utils::{MockLoader, boxed_model, cache_with, run_local};

mod common;

const PLAYER: AssetKey = AssetKey::new(ModelCategory::Player, 7);

fn player_loader() -> Rc<MockLoader> {
    Rc::new(MockLoader::new().with_asset(PLAYER, boxed_model(&["Idle", "Walk", "TPose"])))
}

#[test]
fn rest_pose_is_never_an_action() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let id = SceneInstance::new(cache, SpawnOptions::new(PLAYER))
            .with_default_action(animation_names::IDLE)
            .init(&mut scene)
            .await
            .expect("init");

        let instance = scene.get(id).expect("attached");
        let names: HashSet<&str> = instance.action_names().collect();
        assert_eq!(names, HashSet::from(["Idle", "Walk"]));
        assert!(!instance.has_action(animation_names::REST_POSE));
        assert!(instance.is_playing("Idle"));
        assert!(!instance.is_playing("Walk"));
    });
}

#[test]
fn dimensions_are_zero_until_loaded() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut instance = SceneInstance::new(cache, SpawnOptions::new(PLAYER));

        let before = instance.dimensions();
        assert_eq!((before.width, before.height, before.depth), (0.0, 0.0, 0.0));

        instance.load().await.expect("load");
        let after = instance.dimensions();
        for extent in [after.width, after.height, after.depth] {
            assert!(extent.is_finite() && extent > 0.0);
        }
        assert!((after.height - 2.0).abs() < 1e-5);
    });
}

#[test]
fn instances_of_one_model_move_independently() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let left = SceneInstance::new(
            Rc::clone(&cache),
            SpawnOptions::new(PLAYER).with_position(cgmath::Vector3::new(-2.0, 0.0, 0.0)),
        )
        .init(&mut scene)
        .await
        .expect("left");
        let right = SceneInstance::new(
            Rc::clone(&cache),
            SpawnOptions::new(PLAYER).with_position(cgmath::Vector3::new(2.0, 0.0, 0.0)),
        )
        .init(&mut scene)
        .await
        .expect("right");

        scene
            .get_mut(left)
            .expect("left attached")
            .set_position(cgmath::Vector3::new(-10.0, 0.0, 0.0));

        assert_eq!(
            scene.get(left).expect("left").transform().position,
            cgmath::Vector3::new(-10.0, 0.0, 0.0)
        );
        assert_eq!(
            scene.get(right).expect("right").transform().position,
            cgmath::Vector3::new(2.0, 0.0, 0.0)
        );
        assert_eq!(loader.calls(PLAYER), 1);
        assert_eq!(scene.render_instances().len(), 2);
    });
}

#[test]
fn load_failure_leaves_the_scene_untouched() {
    run_local(async {
        let loader = player_loader();
        loader.fail(PLAYER);
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let err = SceneInstance::new(cache, SpawnOptions::new(PLAYER))
            .init(&mut scene)
            .await
            .unwrap_err();

        assert_eq!(err, ModelCacheError::LoadFailed { key: PLAYER });
        assert!(scene.is_empty());
    });
}

#[test]
fn playing_action_moves_only_its_own_instance() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let walker = SceneInstance::new(Rc::clone(&cache), SpawnOptions::new(PLAYER))
            .init(&mut scene)
            .await
            .expect("walker");
        let idler = SceneInstance::new(Rc::clone(&cache), SpawnOptions::new(PLAYER))
            .init(&mut scene)
            .await
            .expect("idler");

        assert!(scene.get_mut(walker).expect("walker").play("Walk"));
        scene.update(0.5);

        let body_y = |id| {
            let fragment = scene.get(id).and_then(SceneInstance::fragment).expect("loaded");
            let body = fragment.find("body").expect("body node");
            fragment.node(body).expect("node").world_transform().position.y
        };
        assert!((body_y(walker) - 0.5).abs() < 1e-5);
        assert_eq!(body_y(idler), 0.0);
    });
}

#[test]
fn unknown_actions_are_reported() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut instance = SceneInstance::new(cache, SpawnOptions::new(PLAYER));
        instance.load().await.expect("load");

        assert!(!instance.play("Dance"));
        assert!(!instance.stop("Dance"));
        assert!(!instance.play(animation_names::REST_POSE));
    });
}

#[test]
fn car_starts_its_own_animation() {
    run_local(async {
        let loader =
            Rc::new(MockLoader::new().with_asset(Car::KEY, boxed_model(&["Car", "Idle"])));
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let id = SceneInstance::make::<Car>(cache, &mut scene)
            .await
            .expect("car");

        let car = scene.get(id).expect("attached");
        assert_eq!(car.key(), AssetKey::new(ModelCategory::Car, 1));
        assert!(car.is_playing(animation_names::CAR));
        assert!(!car.is_playing(animation_names::IDLE));
    });
}

#[test]
fn missing_default_action_is_not_an_error() {
    run_local(async {
        let loader = Rc::new(MockLoader::new().with_asset(PLAYER, boxed_model(&["Walk"])));
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let id = SceneInstance::new(cache, SpawnOptions::new(PLAYER))
            .with_default_action(animation_names::IDLE)
            .init(&mut scene)
            .await
            .expect("init");

        let instance = scene.get(id).expect("attached");
        assert!(!instance.is_playing("Walk"));
        assert_eq!(scene.len(), 1);
    });
}

#[test]
fn non_finite_frame_times_do_not_disturb_animation() {
    run_local(async {
        let loader = player_loader();
        let cache = cache_with(&loader, CacheConfig::default());
        let mut scene = Scene::new();

        let id = SceneInstance::new(cache, SpawnOptions::new(PLAYER))
            .with_default_action(animation_names::IDLE)
            .init(&mut scene)
            .await
            .expect("init");

        scene.update(0.25);
        scene.update(f32::INFINITY);
        scene.update(f32::NAN);

        let instance = scene.get(id).expect("attached");
        assert!(instance.is_playing("Idle"));
        let fragment = instance.fragment().expect("loaded");
        let body = fragment.find("body").expect("body node");
        let y = fragment.node(body).expect("node").world_transform().position.y;
        assert!((y - 0.25).abs() < 1e-5);
    });
}
