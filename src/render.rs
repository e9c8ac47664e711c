//! Hierarchical draw traversal.
//!
//! This module turns an uploaded scene into a flat, ordered list of [`DrawCall`]s.
//! The walk is depth-first and pre-order: a node's own meshes are emitted before
//! any of its children, and siblings follow the scene's declared child order.
//! Each node's transform is `parent × local`, where `local` is the node's
//! row-major transform transposed into a column-major matrix.
//!
//! # Key types
//!
//! - [`DrawCall`] is everything one draw needs: mesh, composed transform, index
//!   range and the texture unit to bind
//! - [`DrawList`] is the per-frame sequence of draws
//!
//! The traverser knows nothing about cameras or projections; those are folded
//! into the root transform by the caller. The wgpu side consuming a `DrawList`
//! lives in [`crate::renderer`].

use cgmath::Matrix4;

use crate::{
    data_structures::{model::DrawableMesh, scene::NodeId},
    upload::SceneHandle,
};

/// Texture unit the diffuse texture is bound to.
pub const DIFFUSE_TEXTURE_UNIT: u32 = 0;

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub node: NodeId,
    pub mesh: usize,
    pub transform: Matrix4<f32>,
    pub index_count: u32,
    /// `Some(unit)` when the shared texture has to be bound for this draw.
    pub texture_unit: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub draws: Vec<DrawCall>,
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCall> {
        self.draws.iter()
    }
}

/// Walks the scene from its root with `root` as the inherited transform.
///
/// `textured` decides whether draws carry the diffuse texture unit.
pub fn traverse<H: DrawableMesh>(
    handle: &SceneHandle<H>,
    root: Matrix4<f32>,
    textured: bool,
) -> DrawList {
    let mut list = DrawList::default();
    let texture_unit = textured.then_some(DIFFUSE_TEXTURE_UNIT);
    visit(handle, handle.scene().root, root, texture_unit, &mut list);
    list
}

fn visit<H: DrawableMesh>(
    handle: &SceneHandle<H>,
    id: NodeId,
    parent: Matrix4<f32>,
    texture_unit: Option<u32>,
    out: &mut DrawList,
) {
    let node = handle.scene().node(id);
    let transform = parent * node.local_transform();
    for &mesh in &node.meshes {
        out.draws.push(DrawCall {
            node: id,
            mesh,
            transform,
            index_count: handle.mesh(mesh).index_count(),
            texture_unit,
        });
    }
    for &child in &node.children {
        visit(handle, child, transform, texture_unit, out);
    }
}
