//! scene-ngin
//!
//! A small real-time renderer for imported 3D scenes. A scene file is imported
//! into an in-memory node tree, every mesh is interleaved into static GPU
//! buffers once, and each frame the tree is walked depth-first to issue one
//! indexed draw per mesh reference with its accumulated transform.
//!
//! High-level modules
//! - `config`: viewer settings and command-line parsing
//! - `context`: window surface, device and queue
//! - `data_structures`: scene tree, vertex layouts, GPU meshes and textures
//! - `error`: the crate's error type
//! - `flow`: the winit event loop driving the viewer
//! - `pipelines`: shader checks and render pipelines
//! - `render`: traversal of an uploaded scene into draw calls
//! - `renderer`: executes draw calls with wgpu
//! - `resources`: scene and texture import
//! - `upload`: all-or-nothing mesh upload
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod renderer;
pub mod resources;
pub mod upload;

pub use error::{Result, SceneError};
