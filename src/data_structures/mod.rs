//! Engine data structures: the imported scene, vertex layouts, GPU meshes and textures.
//!
//! - `scene` is the node tree and mesh list produced by the importers
//! - `vertex` describes interleaved vertex layouts and mesh build options
//! - `model` holds GPU-resident meshes
//! - `texture` contains the GPU texture wrapper and decoded images
//! - `transform` builds root transforms (scale, spin, camera)

pub mod model;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod vertex;
