//! glTF 2.0 import (`.gltf` with external buffers and binary `.glb`).
//!
//! Every primitive becomes its own [`Mesh`]; a glTF node referencing a mesh
//! references all of that mesh's primitives. The default scene is imported, or
//! the first one when no default is set. A scene with several top-level nodes
//! gets a synthetic identity root so the result is a single tree.

use std::path::Path;

use cgmath::Matrix4;
use gltf::mesh::Mode;

use crate::{
    data_structures::scene::{ImportedScene, Mesh, Node, NodeId, to_row_major},
    error::Result,
    resources::{ImportFlags, import_error, load_binary, post_process},
};

pub fn import(path: &Path, flags: ImportFlags) -> Result<ImportedScene> {
    let bytes = load_binary(path)?;
    let gltf = gltf::Gltf::from_slice(&bytes).map_err(|e| import_error(path, e))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => return Err(import_error(path, "binary chunk referenced but missing")),
            },
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    return Err(import_error(path, "embedded data URIs are not supported"));
                }
                buffer_data.push(load_binary(&base.join(uri))?);
            }
        }
    }

    // glTF mesh index -> indices of its primitives in the flat mesh list
    let mut scene = ImportedScene::new(Node::new("root"));
    let mut primitive_meshes = Vec::new();
    for mesh in gltf.meshes() {
        let mut ids = Vec::new();
        for primitive in mesh.primitives() {
            let name = match mesh.name() {
                Some(name) => format!("{}[{}]", name, primitive.index()),
                None => format!("mesh{}[{}]", mesh.index(), primitive.index()),
            };
            let mut converted = read_primitive(path, &name, &primitive, &buffer_data, flags)?;
            post_process(path, &mut converted, flags)?;
            ids.push(scene.add_mesh(converted));
        }
        primitive_meshes.push(ids);
    }

    let gltf_scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| import_error(path, "file contains no scene"))?;
    let top_level: Vec<_> = gltf_scene.nodes().collect();
    match top_level.as_slice() {
        [single] => {
            scene.nodes[0] = convert_node(single, &primitive_meshes);
            add_children(&mut scene, NodeId(0), single, &primitive_meshes);
        }
        nodes => {
            for node in nodes {
                let id = scene.add_child(NodeId(0), convert_node(node, &primitive_meshes));
                add_children(&mut scene, id, node, &primitive_meshes);
            }
        }
    }
    Ok(scene)
}

fn convert_node(node: &gltf::Node, primitive_meshes: &[Vec<usize>]) -> Node {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let local = Matrix4::from(node.transform().matrix());
    let meshes = node
        .mesh()
        .map(|m| primitive_meshes[m.index()].clone())
        .unwrap_or_default();
    Node::new(name)
        .with_transform(to_row_major(local))
        .with_meshes(meshes)
}

fn add_children(
    scene: &mut ImportedScene,
    parent: NodeId,
    node: &gltf::Node,
    primitive_meshes: &[Vec<usize>],
) {
    for child in node.children() {
        let id = scene.add_child(parent, convert_node(&child, primitive_meshes));
        add_children(scene, id, &child, primitive_meshes);
    }
}

fn read_primitive(
    path: &Path,
    name: &str,
    primitive: &gltf::Primitive,
    buffer_data: &[Vec<u8>],
    flags: ImportFlags,
) -> Result<Mesh> {
    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|p| p.collect())
        .unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = assemble_faces(&indices, primitive.mode(), flags)
        .map_err(|reason| import_error(path, format!("{}: {}", name, reason)))?;

    let mut mesh = Mesh::new(name, positions, faces);
    mesh.tex_coords = reader.read_tex_coords(0).map(|t| t.into_f32().collect());
    mesh.normals = reader.read_normals().map(|n| n.collect());
    mesh.tangents = reader
        .read_tangents()
        .map(|t| t.map(|[x, y, z, _]| [x, y, z]).collect());
    Ok(mesh)
}

/// Groups an index stream into triangles according to the primitive mode.
fn assemble_faces(
    indices: &[u32],
    mode: Mode,
    flags: ImportFlags,
) -> std::result::Result<Vec<[u32; 3]>, String> {
    let triangulate = flags.contains(ImportFlags::TRIANGULATE);
    match mode {
        Mode::Triangles if indices.len() % 3 != 0 => Err(format!(
            "{} triangle list indices are not a multiple of three",
            indices.len()
        )),
        Mode::Triangles => Ok(indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect()),
        Mode::TriangleStrip if triangulate => Ok(indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .collect()),
        Mode::TriangleFan if triangulate => Ok(indices
            .windows(2)
            .skip(1)
            .map(|w| [indices[0], w[0], w[1]])
            .collect()),
        other => Err(format!("primitive mode {:?} cannot be drawn as triangles", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_alternate_winding() {
        let faces = assemble_faces(&[0, 1, 2, 3, 4], Mode::TriangleStrip, ImportFlags::all());
        assert_eq!(faces.unwrap(), vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]);
    }

    #[test]
    fn fans_share_the_first_vertex() {
        let faces = assemble_faces(&[0, 1, 2, 3], Mode::TriangleFan, ImportFlags::all());
        assert_eq!(faces.unwrap(), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn strips_need_triangulation() {
        let faces = assemble_faces(&[0, 1, 2, 3], Mode::TriangleStrip, ImportFlags::empty());
        assert!(faces.is_err());
    }

    #[test]
    fn partial_triangles_are_rejected() {
        let faces = assemble_faces(&[0, 1, 2, 3], Mode::Triangles, ImportFlags::empty());
        assert!(faces.unwrap_err().contains("multiple of three"));
    }

    #[test]
    fn lines_are_rejected() {
        assert!(assemble_faces(&[0, 1], Mode::Lines, ImportFlags::all()).is_err());
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = import(Path::new("does/not/exist.gltf"), ImportFlags::default()).unwrap_err();
        assert!(matches!(err, crate::error::SceneError::Import { .. }));
    }
}
