//! Scene upload: one GPU mesh per imported mesh, all or nothing.
//!
//! [`upload_scene`] validates the scene, builds the interleaved buffers of every
//! mesh and realizes them through a [`MeshAllocator`]. The resulting
//! [`SceneHandle`] owns the GPU meshes in the same order as
//! [`ImportedScene::meshes`], so node mesh references index straight into it.
//! Dropping the handle releases every buffer.

use std::sync::Arc;

use crate::{
    data_structures::{
        model::{DrawableMesh, GpuMesh},
        scene::ImportedScene,
        vertex::{BuildOptions, LayoutPolicy, VertexLayout},
    },
    error::Result,
    resources::mesh::{MeshBuffers, build_mesh_buffers},
};

/// Turns CPU mesh buffers into GPU resources.
///
/// Handles own their resources; dropping one releases it.
pub trait MeshAllocator {
    type Handle: DrawableMesh;

    fn allocate(&mut self, mesh_index: usize, name: &str, buffers: &MeshBuffers)
    -> Result<Self::Handle>;
}

/// Allocates static wgpu vertex and index buffers.
pub struct WgpuAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> WgpuAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }
}

impl MeshAllocator for WgpuAllocator<'_> {
    type Handle = GpuMesh;

    fn allocate(&mut self, _: usize, name: &str, buffers: &MeshBuffers) -> Result<GpuMesh> {
        Ok(GpuMesh::from_buffers(self.device, name, buffers))
    }
}

/// An uploaded scene: the imported scene plus one GPU mesh per scene mesh.
///
/// Only [`upload_scene`] creates handles, so every node's mesh references are
/// known to be in range.
pub struct SceneHandle<H> {
    scene: Arc<ImportedScene>,
    meshes: Vec<H>,
    policy: LayoutPolicy,
    options: BuildOptions,
}

impl<H> SceneHandle<H> {
    pub fn scene(&self) -> &ImportedScene {
        &self.scene
    }

    pub fn meshes(&self) -> &[H] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> &H {
        &self.meshes[index]
    }

    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }
}

impl<H: DrawableMesh> SceneHandle<H> {
    /// Fails with the first mesh whose buffer layout differs from `bound`, the
    /// layout of the pipeline that will draw it.
    pub fn check_layouts(&self, bound: &VertexLayout) -> Result<()> {
        for (idx, mesh) in self.meshes.iter().enumerate() {
            mesh.layout().check_matches(idx, bound)?;
        }
        Ok(())
    }
}

/// Builds and uploads every mesh of `scene`.
///
/// The tree shape and all mesh references are checked before anything is
/// allocated. The first mesh that fails to build aborts the upload; its index is
/// part of the returned error and every handle allocated so far is dropped.
pub fn upload_scene<A: MeshAllocator>(
    scene: Arc<ImportedScene>,
    policy: LayoutPolicy,
    options: BuildOptions,
    allocator: &mut A,
) -> Result<SceneHandle<A::Handle>> {
    scene.validate_tree()?;
    scene.validate_mesh_refs()?;

    let layout = policy.layout();
    let mut meshes = Vec::with_capacity(scene.meshes.len());
    for (idx, mesh) in scene.meshes.iter().enumerate() {
        let buffers = build_mesh_buffers(idx, mesh, &layout, &options).inspect_err(|e| {
            log::error!("aborting scene upload at mesh {idx} ({}): {e}", mesh.name);
        })?;
        log::debug!(
            "mesh {idx} ({}): {} vertices, {} indices",
            mesh.name,
            buffers.vertex_count(),
            buffers.index_count()
        );
        meshes.push(allocator.allocate(idx, &mesh.name, &buffers)?);
    }

    log::info!(
        "uploaded {} meshes and {} nodes ({:?}, {:?})",
        meshes.len(),
        scene.nodes.len(),
        policy,
        options.winding
    );

    Ok(SceneHandle {
        scene,
        meshes,
        policy,
        options,
    })
}
