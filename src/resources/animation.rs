//! Decoded animation clips.
//!
//! A clip is immutable once loaded and shared between every instance of a
//! model; per-instance playback state lives in [`crate::animation::AnimationMixer`].

use cgmath::{InnerSpace, VectorSpace};

use crate::data_structures::{instance::Instance, scene_graph::NodeId};

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) => v.len(),
            Keyframes::Rotation(v) => v.len(),
            Keyframes::Scale(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
}

/// Keyframes for one property of one node.
#[derive(Clone, Debug)]
pub struct Track {
    pub target: NodeId,
    pub interpolation: Interpolation,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

impl Track {
    /// Writes the value at `time` into the matching component of `transform`.
    ///
    /// Times before the first key hold the first value, times after the last key
    /// hold the last value.
    pub fn apply(&self, time: f32, transform: &mut Instance) {
        let count = self.timestamps.len().min(self.keyframes.len());
        if count == 0 {
            return;
        }
        let (i, j, t) = segment(&self.timestamps[..count], time, self.interpolation);
        match &self.keyframes {
            Keyframes::Translation(v) => transform.position = v[i].lerp(v[j], t),
            Keyframes::Scale(v) => transform.scale = v[i].lerp(v[j], t),
            Keyframes::Rotation(v) => {
                transform.rotation = if i == j || t == 0.0 {
                    v[i]
                } else {
                    slerp(v[i], v[j], t)
                }
            }
        }
    }
}

/// Picks the pair of keys around `time` and the blend factor between them.
fn segment(timestamps: &[f32], time: f32, interpolation: Interpolation) -> (usize, usize, f32) {
    let last = timestamps.len() - 1;
    if !time.is_finite() || time <= timestamps[0] {
        return (0, 0, 0.0);
    }
    if time >= timestamps[last] {
        return (last, last, 0.0);
    }
    // first key strictly after `time`; NaN keys can push it to either end
    let next = timestamps.partition_point(|&ts| ts <= time);
    let Some(prev) = next.checked_sub(1) else {
        return (0, 0, 0.0);
    };
    if next > last {
        return (last, last, 0.0);
    }
    match interpolation {
        Interpolation::Step => (prev, prev, 0.0),
        Interpolation::Linear => {
            let span = timestamps[next] - timestamps[prev];
            let t = if span > 0.0 {
                (time - timestamps[prev]) / span
            } else {
                0.0
            };
            (prev, next, t)
        }
    }
}

/// Shortest-path slerp that stays well behaved for nearly equal rotations.
fn slerp(
    from: cgmath::Quaternion<f32>,
    to: cgmath::Quaternion<f32>,
    t: f32,
) -> cgmath::Quaternion<f32> {
    let to = if from.dot(to) < 0.0 { -to } else { to };
    if from.dot(to) > 0.9995 {
        return from.nlerp(to, t);
    }
    from.slerp(to, t)
}

/// A named animation: all tracks that share one glTF animation name.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    /// Time of the latest key over all tracks.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|track| track.timestamps.last())
            .fold(0.0, |acc: f32, &ts| acc.max(ts))
    }
}
