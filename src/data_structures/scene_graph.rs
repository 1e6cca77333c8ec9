//! Scene graph fragments.
//!
//! A [`SceneFragment`] is the node hierarchy of one model: an arena of nodes,
//! each with a local and a world transform and optionally a mesh. Node `0` is
//! always the fragment root; it carries the spawn transform and every node of
//! the decoded asset hangs below it.
//!
//! Mesh data is reference counted. Cloning a fragment copies the hierarchy and
//! transforms but shares the geometry, so a cached model can be handed out any
//! number of times without duplicating vertex data.

use std::rc::Rc;

use cgmath::{EuclideanSpace, Transform};

use crate::data_structures::instance::{Instance, InstanceRaw};

/// Index of a node inside its [`SceneFragment`]. Stable across clones.
pub type NodeId = usize;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Point3<f32>,
    pub max: cgmath::Point3<f32>,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = cgmath::Point3::from(*points.next()?);
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        for p in points {
            aabb.include(cgmath::Point3::from(*p));
        }
        Some(aabb)
    }

    fn include(&mut self, p: cgmath::Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        let mut merged = *self;
        merged.include(other.min);
        merged.include(other.max);
        merged
    }

    /// Bounds of all eight transformed corners.
    pub fn transform(&self, matrix: &cgmath::Matrix4<f32>) -> Aabb {
        let corners = [
            [self.min.x, self.min.y, self.min.z],
            [self.min.x, self.min.y, self.max.z],
            [self.min.x, self.max.y, self.min.z],
            [self.min.x, self.max.y, self.max.z],
            [self.max.x, self.min.y, self.min.z],
            [self.max.x, self.min.y, self.max.z],
            [self.max.x, self.max.y, self.min.z],
            [self.max.x, self.max.y, self.max.z],
        ];
        let mut transformed = corners
            .iter()
            .map(|c| matrix.transform_point(cgmath::Point3::from(*c)));
        // eight corners, the first always exists
        let first = transformed.next().unwrap_or(self.min);
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        transformed.for_each(|p| aabb.include(p));
        aabb
    }

    pub fn size(&self) -> cgmath::Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> cgmath::Point3<f32> {
        cgmath::Point3::from_vec((self.min.to_vec() + self.max.to_vec()) * 0.5)
    }
}

/// Width (x), height (y) and depth (z) of a model's world-space bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl From<Aabb> for Dimensions {
    fn from(aabb: Aabb) -> Self {
        let size = aabb.size();
        Self {
            width: size.x,
            height: size.y,
            depth: size.z,
        }
    }
}

/// Immutable geometry of one mesh primitive.
#[derive(Debug)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
    bounds: Option<Aabb>,
}

impl MeshData {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
        material: Option<usize>,
    ) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            material,
            bounds,
        }
    }

    /// Local-space bounds, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    local: Instance,
    world: Instance,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    meshes: Vec<Rc<MeshData>>,
}

impl Node {
    fn new(name: Option<String>, parent: Option<NodeId>, local: Instance) -> Self {
        Self {
            name,
            local,
            world: local,
            parent,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn local_transform(&self) -> &Instance {
        &self.local
    }

    pub fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    /// World transform as of the last [`SceneFragment::update_world_transforms`].
    pub fn world_transform(&self) -> &Instance {
        &self.world
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn meshes(&self) -> &[Rc<MeshData>] {
        &self.meshes
    }
}

/// The node hierarchy of one model. See the module docs.
#[derive(Clone, Debug)]
pub struct SceneFragment {
    nodes: Vec<Node>,
}

impl SceneFragment {
    pub const ROOT: NodeId = 0;

    /// An empty fragment holding only an identity root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Some("root".to_string()), None, Instance::new())],
        }
    }

    /// Appends a node below `parent` and returns its id.
    ///
    /// An unknown parent attaches the node to the root instead.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: Option<String>,
        local: Instance,
    ) -> NodeId {
        let parent = if parent < self.nodes.len() {
            parent
        } else {
            log::warn!(
                "Parent node {} does not exist in a fragment of {} nodes, attaching to root.",
                parent,
                self.nodes.len()
            );
            Self::ROOT
        };
        let id = self.nodes.len();
        self.nodes.push(Node::new(name, Some(parent), local));
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_mesh(&mut self, node: NodeId, mesh: Rc<MeshData>) {
        match self.nodes.get_mut(node) {
            Some(node) => node.meshes.push(mesh),
            None => log::warn!("Cannot attach mesh {} to missing node {}.", mesh.name, node),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // the root is always there
        self.nodes.len() == 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// Local transform of the root, i.e. the spawn transform.
    pub fn transform(&self) -> &Instance {
        &self.nodes[Self::ROOT].local
    }

    pub fn set_transform(&mut self, transform: Instance) {
        self.nodes[Self::ROOT].local = transform;
    }

    pub fn set_position(&mut self, position: cgmath::Vector3<f32>) {
        self.nodes[Self::ROOT].local.position = position;
    }

    pub fn set_rotation(&mut self, rotation: cgmath::Quaternion<f32>) {
        self.nodes[Self::ROOT].local.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: cgmath::Vector3<f32>) {
        self.nodes[Self::ROOT].local.scale = scale;
    }

    /**
     * Recomputes every world transform top-down as `parent_world * local`.
     *
     * Nodes are only ever appended below existing ones, so a parent always has a
     * lower id than its children and a single forward pass is enough.
     */
    pub fn update_world_transforms(&mut self) {
        for id in 0..self.nodes.len() {
            let world = match self.nodes[id].parent {
                Some(parent) => &self.nodes[parent].world * &self.nodes[id].local,
                None => self.nodes[id].local,
            };
            self.nodes[id].world = world;
        }
    }

    /// World-space bounds of all meshes, `None` if the fragment has no geometry.
    pub fn bounding(&self) -> Option<Aabb> {
        self.nodes
            .iter()
            .flat_map(|node| {
                let matrix = node.world.to_matrix();
                node.meshes
                    .iter()
                    .filter_map(move |mesh| mesh.bounds().map(|b| b.transform(&matrix)))
            })
            .reduce(|acc, b| acc.merge(&b))
    }

    pub fn dimensions(&self) -> Dimensions {
        self.bounding().map(Dimensions::from).unwrap_or_default()
    }

    /// One raw instance per mesh-bearing node, in node order.
    pub fn to_raw_instances(&self) -> Vec<InstanceRaw> {
        self.nodes
            .iter()
            .filter(|node| !node.meshes.is_empty())
            .map(|node| node.world.to_raw())
            .collect()
    }

    /// True if both fragments point at the very same geometry.
    pub fn shares_geometry_with(&self, other: &SceneFragment) -> bool {
        let mut ours = self.nodes.iter().flat_map(|n| n.meshes.iter());
        let mut theirs = other.nodes.iter().flat_map(|n| n.meshes.iter());
        loop {
            match (ours.next(), theirs.next()) {
                (Some(a), Some(b)) if Rc::ptr_eq(a, b) => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl Default for SceneFragment {
    fn default() -> Self {
        Self::new()
    }
}
