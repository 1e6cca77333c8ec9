//! Per-instance animation playback.
//!
//! An [`AnimationMixer`] belongs to exactly one scene instance. Clips are shared
//! with every other instance of the same model, while the playback state (time,
//! playing flag, loop mode) of each bound action lives here.

use std::rc::Rc;

use crate::{
    data_structures::scene_graph::SceneFragment, resources::animation::AnimationClip,
};

/// Handle to an action created by [`AnimationMixer::clip_action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Wrap around at the end of the clip.
    #[default]
    Repeat,
    /// Hold the last frame and stop.
    Once,
}

#[derive(Debug)]
struct Action {
    clip: Rc<AnimationClip>,
    /// Indices into `clip.tracks` whose target exists in the bound fragment.
    tracks: Vec<usize>,
    duration: f32,
    time: f32,
    playing: bool,
    loop_mode: LoopMode,
}

#[derive(Debug)]
pub struct AnimationMixer {
    actions: Vec<Action>,
    pub time_scale: f32,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            time_scale: 1.0,
        }
    }

    /// Binds `clip` to `fragment` and returns a stopped action for it.
    ///
    /// Binding the same clip twice returns the existing action.
    pub fn clip_action(&mut self, clip: Rc<AnimationClip>, fragment: &SceneFragment) -> ActionId {
        if let Some(idx) = self
            .actions
            .iter()
            .position(|action| Rc::ptr_eq(&action.clip, &clip))
        {
            return ActionId(idx);
        }
        let tracks = clip
            .tracks
            .iter()
            .enumerate()
            .filter_map(|(idx, track)| {
                if fragment.node(track.target).is_some() {
                    Some(idx)
                } else {
                    log::warn!(
                        "Track {} of clip {} targets node {}, which the fragment does not have.",
                        idx,
                        clip.name,
                        track.target
                    );
                    None
                }
            })
            .collect();
        let duration = clip.duration();
        self.actions.push(Action {
            clip,
            tracks,
            duration,
            time: 0.0,
            playing: false,
            loop_mode: LoopMode::default(),
        });
        ActionId(self.actions.len() - 1)
    }

    pub fn play(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.playing = true;
        }
    }

    /// Stops the action and rewinds it.
    pub fn stop(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.playing = false;
            action.time = 0.0;
        }
    }

    pub fn stop_all(&mut self) {
        for idx in 0..self.actions.len() {
            self.stop(ActionId(idx));
        }
    }

    pub fn set_loop_mode(&mut self, id: ActionId, loop_mode: LoopMode) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.loop_mode = loop_mode;
        }
    }

    pub fn is_playing(&self, id: ActionId) -> bool {
        self.actions.get(id.0).is_some_and(|action| action.playing)
    }

    pub fn time(&self, id: ActionId) -> Option<f32> {
        self.actions.get(id.0).map(|action| action.time)
    }

    pub fn clip(&self, id: ActionId) -> Option<&AnimationClip> {
        self.actions.get(id.0).map(|action| action.clip.as_ref())
    }

    /// Advances every playing action by `delta` seconds and poses `fragment`.
    ///
    /// Leaves the fragment untouched when nothing is playing or `delta` is not finite.
    pub fn update(&mut self, delta: f32, fragment: &mut SceneFragment) {
        if !self.actions.iter().any(|action| action.playing) {
            return;
        }
        let delta = delta * self.time_scale;
        if !delta.is_finite() {
            log::warn!("Ignoring animation step of {} seconds.", delta);
            return;
        }
        for action in self.actions.iter_mut().filter(|action| action.playing) {
            action.time += delta;
            if action.time >= action.duration {
                match action.loop_mode {
                    LoopMode::Repeat if action.duration > 0.0 => {
                        action.time %= action.duration;
                    }
                    LoopMode::Repeat => action.time = 0.0,
                    LoopMode::Once => {
                        action.time = action.duration;
                        action.playing = false;
                    }
                }
            }
            for &idx in &action.tracks {
                let track = &action.clip.tracks[idx];
                if let Some(node) = fragment.node_mut(track.target) {
                    track.apply(action.time, node.local_transform_mut());
                }
            }
        }
        fragment.update_world_transforms();
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}
