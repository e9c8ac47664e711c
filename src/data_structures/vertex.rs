//! Vertex layout descriptors and mesh build options.
//!
//! The interleaved vertex stream always starts with a position. What follows is
//! decided by the [`LayoutPolicy`]: a reserved/color slot and, for textured
//! scenes, a UV slot. [`VertexLayout`] is the single source of truth for both the
//! CPU-side builder and the wgpu vertex buffer layout, so the two cannot drift.

use std::mem;

use crate::error::{Result, SceneError};

/// Shader location of the position attribute.
pub const POSITION_SLOT: u32 = 0;
/// Shader location of the reserved/color attribute.
pub const RESERVED_SLOT: u32 = 1;
/// Shader location of the texture coordinate attribute.
pub const UV_SLOT: u32 = 2;

/// Which optional attributes follow the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LayoutPolicy {
    /// position(3f) + color(3f)
    WithColor,
    /// position(3f) + reserved(3f) + uv(2f)
    #[default]
    WithUv,
}

impl LayoutPolicy {
    pub fn layout(self) -> VertexLayout {
        match self {
            LayoutPolicy::WithColor => VertexLayout::new(true, false),
            LayoutPolicy::WithUv => VertexLayout::new(true, true),
        }
    }

    pub fn is_textured(self) -> bool {
        matches!(self, LayoutPolicy::WithUv)
    }
}

/// Order in which a face's three indices are written to the index buffer.
///
/// The render pipeline takes its front face from this value, so back-face
/// culling keeps agreeing with the emitted triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WindingOrder {
    /// `[a, b, c]` as stored in the mesh.
    #[default]
    AsAuthored,
    /// `[c, b, a]`
    Reversed,
}

impl WindingOrder {
    pub fn apply(self, face: [u32; 3]) -> [u32; 3] {
        match self {
            WindingOrder::AsAuthored => face,
            WindingOrder::Reversed => [face[2], face[1], face[0]],
        }
    }

    /// Imported meshes are counter-clockwise when viewed from the front.
    pub fn front_face(self) -> wgpu::FrontFace {
        match self {
            WindingOrder::AsAuthored => wgpu::FrontFace::Ccw,
            WindingOrder::Reversed => wgpu::FrontFace::Cw,
        }
    }
}

/// What to write into the reserved/color slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReservedFill {
    #[default]
    Zeroed,
    /// A random color per vertex, handy to see untextured geometry.
    RandomColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub winding: WindingOrder,
    pub reserved: ReservedFill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub slot: u32,
    pub components: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u64,
}

impl VertexAttribute {
    fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    wgpu_attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn new(reserved: bool, uv: bool) -> Self {
        let mut attributes = Vec::with_capacity(3);
        let mut offset = 0u64;
        let mut push = |slot, components: u32| {
            attributes.push(VertexAttribute {
                slot,
                components,
                offset,
            });
            offset += (components as usize * mem::size_of::<f32>()) as u64;
        };
        push(POSITION_SLOT, 3);
        if reserved {
            push(RESERVED_SLOT, 3);
        }
        if uv {
            push(UV_SLOT, 2);
        }
        let wgpu_attributes = attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                offset: a.offset,
                shader_location: a.slot,
                format: a.format(),
            })
            .collect();
        Self {
            attributes,
            wgpu_attributes,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, slot: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.slot == slot)
    }

    pub fn has_reserved(&self) -> bool {
        self.attribute(RESERVED_SLOT).is_some()
    }

    pub fn has_uv(&self) -> bool {
        self.attribute(UV_SLOT).is_some()
    }

    pub fn floats_per_vertex(&self) -> usize {
        self.attributes.iter().map(|a| a.components as usize).sum()
    }

    /// Bytes between consecutive vertices.
    pub fn stride(&self) -> u64 {
        (self.floats_per_vertex() * mem::size_of::<f32>()) as u64
    }

    /// Checks that a buffer built for `self` can be read through `bound`: same
    /// stride and the same slots at the same offsets and widths.
    pub fn check_matches(&self, mesh: usize, bound: &VertexLayout) -> Result<()> {
        let mismatch =
            |reason: String| -> Result<()> { Err(SceneError::LayoutMismatch { mesh, reason }) };
        if self.stride() != bound.stride() {
            return mismatch(format!(
                "stride {} bytes, pipeline expects {}",
                self.stride(),
                bound.stride()
            ));
        }
        for expected in &bound.attributes {
            match self.attribute(expected.slot) {
                Some(built) if built == expected => {}
                Some(built) => {
                    return mismatch(format!(
                        "slot {} is {}f at offset {}, pipeline expects {}f at offset {}",
                        expected.slot,
                        built.components,
                        built.offset,
                        expected.components,
                        expected.offset
                    ));
                }
                None => return mismatch(format!("slot {} is missing", expected.slot)),
            }
        }
        if self.attributes.len() != bound.attributes.len() {
            return mismatch(format!(
                "{} attributes, pipeline expects {}",
                self.attributes.len(),
                bound.attributes.len()
            ));
        }
        Ok(())
    }

    pub fn desc(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.wgpu_attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_layout_offsets_and_stride() {
        let layout = LayoutPolicy::WithUv.layout();
        let offsets: Vec<_> = layout
            .attributes()
            .iter()
            .map(|a| (a.slot, a.offset))
            .collect();
        assert_eq!(offsets, vec![(0, 0), (1, 12), (2, 24)]);
        assert_eq!(layout.floats_per_vertex(), 8);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn color_layout_has_no_uv_slot() {
        let layout = LayoutPolicy::WithColor.layout();
        assert!(layout.has_reserved());
        assert!(!layout.has_uv());
        assert_eq!(layout.stride(), 24);
        assert_eq!(layout.desc().attributes.len(), 2);
    }

    #[test]
    fn identical_layouts_match() {
        let layout = LayoutPolicy::WithUv.layout();
        assert!(layout.check_matches(0, &LayoutPolicy::WithUv.layout()).is_ok());
    }

    #[test]
    fn color_buffer_cannot_feed_textured_pipeline() {
        let built = LayoutPolicy::WithColor.layout();
        let err = built
            .check_matches(4, &LayoutPolicy::WithUv.layout())
            .unwrap_err();
        assert!(matches!(err, SceneError::LayoutMismatch { mesh: 4, .. }));
        assert!(err.to_string().contains("stride 24 bytes"));
    }

    #[test]
    fn winding_reverses_face_and_flips_front_face() {
        assert_eq!(WindingOrder::AsAuthored.apply([1, 2, 3]), [1, 2, 3]);
        assert_eq!(WindingOrder::Reversed.apply([1, 2, 3]), [3, 2, 1]);
        assert_eq!(WindingOrder::Reversed.front_face(), wgpu::FrontFace::Cw);
    }
}
