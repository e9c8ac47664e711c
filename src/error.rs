//! Error types for scene import, upload and rendering.
//!
//! Every fallible library operation returns [`Result<T>`], an alias for
//! `std::result::Result<T, SceneError>`. Failures during one-time setup (import,
//! decode, upload, shader compilation) carry enough context (file, mesh index,
//! node) to diagnose them. Nothing in this crate retries.

use std::path::PathBuf;

use thiserror::Error;

use crate::data_structures::scene::NodeId;

/// Which per-vertex attribute a mesh was missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord0,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::Position => f.write_str("position"),
            Attribute::TexCoord0 => f.write_str("uv channel 0"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene file could not be read or parsed.
    #[error("failed to import scene {path:?}: {reason}")]
    Import { path: PathBuf, reason: String },

    /// The texture image could not be read or decoded.
    #[error("failed to decode image {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The decoded pixel buffer does not match its declared dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A mesh lacks an attribute the target vertex layout requires.
    #[error("mesh {mesh} is missing the {attribute} attribute required by the vertex layout")]
    MissingAttribute { mesh: usize, attribute: Attribute },

    /// A triangle references a vertex the mesh does not have.
    #[error("mesh {mesh}, face {face}: vertex index {index} is out of range (vertex count {vertex_count})")]
    FaceIndexOutOfRange {
        mesh: usize,
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A node references a mesh outside the scene's mesh list.
    #[error("node {node} references mesh {mesh}, but the scene only has {mesh_count} meshes")]
    IndexOutOfRange {
        node: NodeId,
        mesh: usize,
        mesh_count: usize,
    },

    /// A mesh's vertex buffer was built for a different layout than the one
    /// bound at draw time.
    #[error("mesh {mesh}: vertex buffer layout does not match the pipeline ({reason})")]
    LayoutMismatch { mesh: usize, reason: String },

    /// The node arena is not a single-rooted tree.
    #[error("invalid scene tree: {0}")]
    InvalidTree(String),

    /// The shader source failed to parse or validate.
    #[error("shader {label} failed to compile: {reason}")]
    Compile { label: String, reason: String },

    /// The shader's interface does not fit the pipeline it is linked into.
    #[error("shader {label} failed to link: {reason}")]
    Link { label: String, reason: String },

    /// A frame was requested before any scene finished uploading.
    #[error("no scene has been uploaded yet")]
    NotUploaded,

    /// The GPU context could not be created.
    #[error("graphics context setup failed: {0}")]
    Context(String),

    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T> = std::result::Result<T, SceneError>;
