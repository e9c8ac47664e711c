use std::num::NonZeroU64;

use cgmath::Matrix4;

use crate::{
    data_structures::{
        texture::Texture,
        vertex::{LayoutPolicy, VertexLayout, WindingOrder},
    },
    error::Result,
    pipelines::shader::{self, CheckedShader, FRAGMENT_ENTRY, VERTEX_ENTRY},
    resources::texture::diffuse_layout,
};

pub const COLORED_SHADER: &str = include_str!("colored.wgsl");
pub const TEXTURED_SHADER: &str = include_str!("textured.wgsl");

/// Per-draw uniform: the composed model-view-projection matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub mvp: [[f32; 4]; 4],
}

impl From<Matrix4<f32>> for TransformUniform {
    fn from(m: Matrix4<f32>) -> Self {
        Self { mvp: m.into() }
    }
}

pub fn transform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(size_of::<TransformUniform>() as u64),
            },
            count: None,
        }],
        label: Some("transform_bind_group_layout"),
    })
}

/// The render pipeline for one vertex layout, plus the layouts its bind groups
/// are created from.
pub struct ScenePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub transform_layout: wgpu::BindGroupLayout,
    /// Present for the textured layout only.
    pub texture_layout: Option<wgpu::BindGroupLayout>,
    pub vertex_layout: VertexLayout,
}

impl ScenePipeline {
    /// Checks the bundled shader for `policy` and builds the pipeline.
    ///
    /// The front face follows `winding` so culling keeps matching the index
    /// buffers built with the same winding.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        policy: LayoutPolicy,
        winding: WindingOrder,
    ) -> Result<Self> {
        let vertex_layout = policy.layout();
        let textured = policy.is_textured();
        let (label, source) = if textured {
            ("textured scene shader", TEXTURED_SHADER)
        } else {
            ("colored scene shader", COLORED_SHADER)
        };
        let shader = shader::check(label, source, &vertex_layout, textured)?;

        let transform_layout = transform_layout(device);
        let texture_layout = textured.then(|| diffuse_layout(device));
        let mut bind_group_layouts = vec![&transform_layout];
        bind_group_layouts.extend(texture_layout.as_ref());

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = mk_render_pipeline(
            device,
            &render_pipeline_layout,
            color_format,
            Some(Texture::DEPTH_FORMAT),
            &[vertex_layout.desc()],
            winding.front_face(),
            &shader,
        );
        log::info!("created {label} pipeline ({:?})", winding.front_face());

        Ok(Self {
            pipeline,
            transform_layout,
            texture_layout,
            vertex_layout,
        })
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    front_face: wgpu::FrontFace,
    shader: &CheckedShader,
) -> wgpu::RenderPipeline {
    let module = shader.create_module(device);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(&shader.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(VERTEX_ENTRY),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
