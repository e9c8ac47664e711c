//! GPU-resident meshes.
//!
//! A [`GpuMesh`] owns the vertex and index buffers built from one imported mesh
//! together with the layout they were built for. Buffers are static: they are
//! written once at upload time and released when the mesh is dropped.

use wgpu::util::DeviceExt;

use crate::{data_structures::vertex::VertexLayout, resources::mesh::MeshBuffers};

/// Anything the traverser can issue a draw for.
pub trait DrawableMesh {
    fn index_count(&self) -> u32;
    /// The vertex layout the mesh's buffer was built with.
    fn layout(&self) -> &VertexLayout;
}

#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub layout: VertexLayout,
}

impl GpuMesh {
    pub fn from_buffers(device: &wgpu::Device, name: &str, buffers: &MeshBuffers) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&buffers.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&buffers.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: buffers.index_count(),
            layout: buffers.layout.clone(),
        }
    }
}

impl DrawableMesh for GpuMesh {
    fn index_count(&self) -> u32 {
        self.num_elements
    }

    fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

pub trait DrawMesh {
    /// Binds the mesh's buffers and draws its full index range.
    fn draw_gpu_mesh(&mut self, mesh: &GpuMesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_gpu_mesh(&mut self, mesh: &GpuMesh) {
        if mesh.num_elements == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}
