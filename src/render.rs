//! The narrow seam between the experience and whatever draws it.
//!
//! The experience never draws itself. Each frame it hands a [`Frame`] to a
//! [`Renderer`], which only has to know how to draw, how to resize and how to
//! release its resources.
//!
//! # Key types
//!
//! - [`Renderer`] is implemented by the drawing backend
//! - [`Frame`] is everything a backend needs for one frame
//! - [`Projection`] is the perspective projection kept in sync with the viewport
//! - [`HeadlessRenderer`] records frames without drawing, for tests and tools
//!

use cgmath::{Deg, Rad};

use crate::{data_structures::instance::InstanceRaw, scene::Scene};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Directional,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub colour: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(800, 600, Deg(65.0), 0.1, 2000.0)
    }
}

/// Everything a renderer gets to see for one frame.
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub projection: &'a Projection,
    pub camera_position: cgmath::Point3<f32>,
    pub lights: &'a [Light],
    /// World transforms of all mesh-bearing nodes, already in upload layout.
    pub instances: Vec<InstanceRaw>,
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);

    fn set_size(&mut self, width: u32, height: u32);

    /// Releases backend resources. Called once on teardown.
    fn dispose(&mut self) {}
}

/// Counts frames and keeps the last frame's instance data.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub size: (u32, u32),
    pub disposed: bool,
    /// Scene instances seen in the last frame.
    pub last_scene_len: usize,
    last_instances: Vec<InstanceRaw>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_instances(&self) -> &[InstanceRaw] {
        &self.last_instances
    }

    /// The last frame's instances exactly as a GPU buffer would receive them.
    pub fn last_instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.last_instances)
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        self.last_scene_len = frame.scene.len();
        self.last_instances = frame.instances.clone();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
