use std::path::{Path, PathBuf};

use bitflags::bitflags;

use crate::{
    data_structures::scene::{ImportedScene, Mesh},
    error::{Result, SceneError},
};

/**
 * This module contains all logic for loading scenes and textures from external files.
 */
pub mod gltf;
pub mod mesh;
pub mod obj;
pub mod texture;

bitflags! {
    /// Post-processing applied while importing a scene.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ImportFlags: u32 {
        /// Split polygons, strips and fans into triangle lists.
        const TRIANGULATE = 1 << 0;
        /// Generate smooth per-vertex normals for meshes that have none.
        const GEN_SMOOTH_NORMALS = 1 << 1;
        /// Flip the V texture coordinate.
        const FLIP_UVS = 1 << 2;
        /// Compute per-vertex tangents for meshes with texture coordinates.
        const CALC_TANGENT_SPACE = 1 << 3;

        const TARGET_REALTIME = Self::TRIANGULATE.bits()
            | Self::GEN_SMOOTH_NORMALS.bits()
            | Self::CALC_TANGENT_SPACE.bits();
    }
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self::TARGET_REALTIME
    }
}

/// Resolves `file_name` against `asset_root` unless it already points at a file.
pub fn resolve_asset(asset_root: &Path, file_name: &str) -> PathBuf {
    let direct = Path::new(file_name);
    if direct.is_absolute() || direct.exists() {
        direct.to_path_buf()
    } else {
        asset_root.join(file_name)
    }
}

pub fn load_binary(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| import_error(path, e))
}

pub fn load_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| import_error(path, e))
}

pub(crate) fn import_error(path: &Path, reason: impl ToString) -> SceneError {
    SceneError::Import {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Imports a scene, choosing the importer from the file extension.
pub fn import_scene(path: &Path, flags: ImportFlags) -> Result<ImportedScene> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let scene = match extension.as_deref() {
        Some("gltf") | Some("glb") => self::gltf::import(path, flags)?,
        Some("obj") => self::obj::import(path, flags)?,
        other => {
            return Err(import_error(
                path,
                format!("unsupported scene format {:?}", other.unwrap_or("")),
            ));
        }
    };
    scene.validate_tree()?;
    scene.validate_mesh_refs()?;
    log::info!(
        "imported {:?}: {} meshes, {} nodes",
        path,
        scene.meshes.len(),
        scene.nodes.len()
    );
    Ok(scene)
}

/// Rejects meshes whose faces or attribute streams disagree with the vertex count.
///
/// Runs on every imported mesh before [`post_process`] reads the attributes.
pub(crate) fn check_attributes(path: &Path, mesh: &Mesh) -> Result<()> {
    let vertex_count = mesh.vertex_count();
    if let Some((face, &index)) = mesh
        .faces
        .iter()
        .enumerate()
        .find_map(|(f, face)| face.iter().find(|&&i| i as usize >= vertex_count).map(|i| (f, i)))
    {
        return Err(import_error(
            path,
            format!(
                "{}: face {face} references vertex {index}, but there are only {vertex_count}",
                mesh.name
            ),
        ));
    }
    let streams = [
        ("uv", mesh.tex_coords.as_ref().map(Vec::len)),
        ("normal", mesh.normals.as_ref().map(Vec::len)),
        ("tangent", mesh.tangents.as_ref().map(Vec::len)),
    ];
    for (attribute, len) in streams {
        match len {
            Some(len) if len != vertex_count => {
                return Err(import_error(
                    path,
                    format!(
                        "{}: {len} {attribute} entries for {vertex_count} vertices",
                        mesh.name
                    ),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Checks `mesh` and applies the attribute-generating flags shared by every importer.
pub(crate) fn post_process(path: &Path, mesh: &mut Mesh, flags: ImportFlags) -> Result<()> {
    check_attributes(path, mesh)?;
    if flags.contains(ImportFlags::FLIP_UVS) {
        if let Some(uvs) = mesh.tex_coords.as_mut() {
            uvs.iter_mut().for_each(|uv| uv[1] = 1.0 - uv[1]);
        }
    }
    if flags.contains(ImportFlags::GEN_SMOOTH_NORMALS) && mesh.normals.is_none() {
        mesh.normals = Some(mesh::smooth_normals(&mesh.positions, &mesh.faces));
    }
    if flags.contains(ImportFlags::CALC_TANGENT_SPACE) && mesh.tangents.is_none() {
        if let Some(uvs) = &mesh.tex_coords {
            mesh.tangents = Some(mesh::tangents(&mesh.positions, uvs, &mesh.faces));
        }
    }
    Ok(())
}

/// Turns a polygon-with-arities index list into triangles, fanning each polygon.
pub(crate) fn triangulate_polygons(
    indices: &[u32],
    arities: &[u32],
) -> std::result::Result<Vec<[u32; 3]>, String> {
    let mut faces = Vec::with_capacity(indices.len() / 3);
    let mut start = 0usize;
    for &arity in arities {
        let arity = arity as usize;
        let polygon = indices.get(start..start + arity).ok_or_else(|| {
            format!(
                "polygon at index {start} needs {arity} indices, only {} remain",
                indices.len().saturating_sub(start)
            )
        })?;
        for i in 1..arity.saturating_sub(1) {
            faces.push([polygon[0], polygon[i], polygon[i + 1]]);
        }
        start += arity;
    }
    Ok(faces)
}
