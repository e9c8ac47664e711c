#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use cgmath::Matrix4;
use scene_ngin::{
    data_structures::{
        model::DrawableMesh,
        scene::{ImportedScene, Mesh},
        vertex::VertexLayout,
    },
    error::{Result, SceneError},
    resources::mesh::MeshBuffers,
    upload::MeshAllocator,
};

/// Stand-in for a GPU mesh that tracks how many are alive.
pub(crate) struct CountedMesh {
    live: Rc<Cell<usize>>,
    pub index_count: u32,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub layout: VertexLayout,
}

impl Drop for CountedMesh {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl DrawableMesh for CountedMesh {
    fn index_count(&self) -> u32 {
        self.index_count
    }

    fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

/// Records every allocation and optionally fails at a given mesh index.
#[derive(Default)]
pub(crate) struct CountingAllocator {
    pub live: Rc<Cell<usize>>,
    pub allocated: Vec<usize>,
    pub fail_at: Option<usize>,
}

impl CountingAllocator {
    pub(crate) fn failing_at(mesh_index: usize) -> Self {
        Self {
            fail_at: Some(mesh_index),
            ..Default::default()
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.live.get()
    }
}

impl MeshAllocator for CountingAllocator {
    type Handle = CountedMesh;

    fn allocate(&mut self, mesh_index: usize, _: &str, buffers: &MeshBuffers) -> Result<CountedMesh> {
        if self.fail_at == Some(mesh_index) {
            return Err(SceneError::Context(format!("out of memory at mesh {mesh_index}")));
        }
        self.allocated.push(mesh_index);
        self.live.set(self.live.get() + 1);
        Ok(CountedMesh {
            live: self.live.clone(),
            index_count: buffers.index_count(),
            vertices: buffers.vertices.clone(),
            indices: buffers.indices.clone(),
            layout: buffers.layout.clone(),
        })
    }
}

pub(crate) fn triangle(name: &str) -> Mesh {
    Mesh::new(
        name,
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![[0, 1, 2]],
    )
    .with_tex_coords(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
}

pub(crate) fn quad(name: &str) -> Mesh {
    Mesh::new(
        name,
        vec![
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .with_tex_coords(vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
}

pub(crate) fn scene_with_meshes(meshes: impl IntoIterator<Item = Mesh>) -> ImportedScene {
    let mut scene = ImportedScene::new(scene_ngin::data_structures::scene::Node::new("root"));
    for mesh in meshes {
        scene.add_mesh(mesh);
    }
    scene
}

pub(crate) fn assert_close(actual: Matrix4<f32>, expected: Matrix4<f32>) {
    let a: [[f32; 4]; 4] = actual.into();
    let e: [[f32; 4]; 4] = expected.into();
    for col in 0..4 {
        for row in 0..4 {
            assert!(
                (a[col][row] - e[col][row]).abs() < 1e-5,
                "matrices differ at column {col}, row {row}:\n{actual:?}\n{expected:?}"
            );
        }
    }
}

pub(crate) fn is_close(actual: Matrix4<f32>, expected: Matrix4<f32>) -> bool {
    let a: [[f32; 4]; 4] = actual.into();
    let e: [[f32; 4]; 4] = expected.into();
    a.iter()
        .flatten()
        .zip(e.iter().flatten())
        .all(|(x, y)| (x - y).abs() < 1e-5)
}
