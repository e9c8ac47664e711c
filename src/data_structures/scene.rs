//! In-memory scene graph as produced by the importers.
//!
//! An [`ImportedScene`] is a flat list of [`Mesh`]es plus an arena of [`Node`]s.
//! Nodes reference meshes by index and children by [`NodeId`]. The scene is
//! treated as immutable once imported; the renderer only reads it.

use std::fmt;

use cgmath::{Matrix, Matrix4};

use crate::error::{Result, SceneError};

/// Index of a node inside [`ImportedScene::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity in row-major storage.
pub const IDENTITY_ROWS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    /// Local transform, stored row-major (`transform[row][col]`).
    pub transform: [[f32; 4]; 4],
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: IDENTITY_ROWS,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, rows: [[f32; 4]; 4]) -> Self {
        self.transform = rows;
        self
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes = meshes.into_iter().collect();
        self
    }

    /// The local transform as a column-major cgmath matrix.
    ///
    /// `Matrix4::from([[f32; 4]; 4])` reads each inner array as a column, so the
    /// row-major storage comes out transposed and has to be flipped back.
    pub fn local_transform(&self) -> Matrix4<f32> {
        Matrix4::from(self.transform).transpose()
    }
}

/// Converts a column-major matrix (cgmath, glTF) into row-major node storage.
pub fn to_row_major(m: Matrix4<f32>) -> [[f32; 4]; 4] {
    m.transpose().into()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Texture channel 0, one entry per vertex when present.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Filled by the importer (`GEN_SMOOTH_NORMALS`). No vertex layout reads it.
    pub normals: Option<Vec<[f32; 3]>>,
    /// Filled by the importer (`CALC_TANGENT_SPACE`). No vertex layout reads it.
    pub tangents: Option<Vec<[f32; 3]>>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.into(),
            positions,
            faces,
            ..Default::default()
        }
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<[f32; 2]>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportedScene {
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

impl ImportedScene {
    /// A scene whose root is the first node pushed.
    pub fn new(root: Node) -> Self {
        Self {
            meshes: Vec::new(),
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    /// Checks the tree invariants: every child id exists, the root has no parent,
    /// every other node has exactly one parent, and every node is reachable from
    /// the root (which rules out cycles).
    pub fn validate_tree(&self) -> Result<()> {
        let count = self.nodes.len();
        if self.root.0 >= count {
            return Err(SceneError::InvalidTree(format!(
                "root {} does not exist ({} nodes)",
                self.root, count
            )));
        }
        let mut parents = vec![0usize; count];
        for (idx, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                if child.0 >= count {
                    return Err(SceneError::InvalidTree(format!(
                        "node #{} has a child {} that does not exist",
                        idx, child
                    )));
                }
                parents[child.0] += 1;
            }
        }
        if parents[self.root.0] != 0 {
            return Err(SceneError::InvalidTree(format!(
                "root {} is referenced as a child",
                self.root
            )));
        }
        if let Some((idx, n)) = parents
            .iter()
            .enumerate()
            .find(|&(idx, &n)| idx != self.root.0 && n != 1)
        {
            return Err(SceneError::InvalidTree(format!(
                "node #{} has {} parents, expected exactly one",
                idx, n
            )));
        }
        // with one parent each, an unreachable node can only sit on a cycle
        let mut seen = vec![false; count];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        if let Some(idx) = seen.iter().position(|s| !s) {
            return Err(SceneError::InvalidTree(format!(
                "node #{} is not reachable from the root",
                idx
            )));
        }
        Ok(())
    }

    /// Checks that every mesh reference points into the mesh list.
    pub fn validate_mesh_refs(&self) -> Result<()> {
        let mesh_count = self.meshes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(&mesh) = node.meshes.iter().find(|&&m| m >= mesh_count) {
                return Err(SceneError::IndexOutOfRange {
                    node: NodeId(idx),
                    mesh,
                    mesh_count,
                });
            }
        }
        Ok(())
    }
}
