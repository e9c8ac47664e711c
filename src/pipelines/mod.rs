//! Render pipelines for uploaded scenes.
//!
//! - `scene` builds the colored and textured scene pipelines
//! - `shader` checks WGSL sources with naga before they reach wgpu

pub mod scene;
pub mod shader;
