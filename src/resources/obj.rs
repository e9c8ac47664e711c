//! Wavefront OBJ import.
//!
//! OBJ has no hierarchy: the result is an identity root with one child node per
//! object/group in file order, each referencing its own mesh. Material
//! libraries are ignored. OBJ puts the texture origin in the lower-left corner;
//! V is flipped on import so every imported scene uses the upper-left origin.

use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::scene::{ImportedScene, Mesh, Node},
    error::Result,
    resources::{ImportFlags, import_error, load_string, post_process, triangulate_polygons},
};

pub fn import(path: &Path, flags: ImportFlags) -> Result<ImportedScene> {
    let obj_text = load_string(path)?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, _) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: false,
            single_index: true,
            ..Default::default()
        },
        |_| Ok(Default::default()),
    )
    .map_err(|e| import_error(path, e))?;

    let mut scene = ImportedScene::new(Node::new("root"));
    let root = scene.root;
    for model in models {
        let mut mesh = convert_model(path, &model, flags)?;
        post_process(path, &mut mesh, flags)?;
        let id = scene.add_mesh(mesh);
        scene.add_child(root, Node::new(model.name).with_meshes([id]));
    }
    Ok(scene)
}

fn convert_model(path: &Path, model: &tobj::Model, flags: ImportFlags) -> Result<Mesh> {
    let m = &model.mesh;
    let positions: Vec<[f32; 3]> = m
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let all_triangles = m.face_arities.iter().all(|&a| a == 3);
    let faces = if all_triangles {
        if m.indices.len() % 3 != 0 {
            return Err(import_error(
                path,
                format!("{}: index count is not a multiple of three", model.name),
            ));
        }
        m.indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    } else if flags.contains(ImportFlags::TRIANGULATE) {
        triangulate_polygons(&m.indices, &m.face_arities)
            .map_err(|reason| import_error(path, format!("{}: {}", model.name, reason)))?
    } else {
        return Err(import_error(
            path,
            format!("{}: polygons with more than three vertices", model.name),
        ));
    };

    let mut mesh = Mesh::new(model.name.clone(), positions, faces);
    if !m.texcoords.is_empty() {
        mesh.tex_coords = Some(
            m.texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect(),
        );
    }
    if !m.normals.is_empty() {
        mesh.normals = Some(
            m.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect(),
        );
    }
    Ok(mesh)
}
