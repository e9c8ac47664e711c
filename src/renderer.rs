//! The render-loop entry point.
//!
//! [`SceneRenderer`] owns at most one uploaded scene together with its
//! pipeline, its diffuse texture and the per-draw transform buffer. Uploading
//! a new scene replaces the old one only once every step succeeded.

use std::sync::Arc;

use cgmath::Matrix4;

use crate::{
    context::Context,
    data_structures::{
        model::{DrawMesh, GpuMesh},
        scene::ImportedScene,
        texture::{DecodedImage, Texture},
        vertex::{BuildOptions, LayoutPolicy},
    },
    error::{Result, SceneError},
    pipelines::scene::{ScenePipeline, TransformUniform},
    render::{DrawList, traverse},
    upload::{SceneHandle, WgpuAllocator, upload_scene},
};

/// Rounds `size` up to the next multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Packs one [`TransformUniform`] per draw, each starting `stride` bytes after
/// the previous one.
pub fn pack_transforms(list: &DrawList, stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0u8; list.len() * stride];
    for (i, draw) in list.iter().enumerate() {
        let uniform = TransformUniform::from(draw.transform);
        let start = i * stride;
        bytes[start..start + size_of::<TransformUniform>()]
            .copy_from_slice(bytemuck::bytes_of(&uniform));
    }
    bytes
}

/// Makes the layout policy and the texture agree. A textured policy without an
/// image falls back to colors; an image under the color policy is dropped.
fn settle_texture(
    policy: LayoutPolicy,
    texture: Option<DecodedImage>,
) -> (LayoutPolicy, Option<DecodedImage>) {
    match (policy, texture) {
        (LayoutPolicy::WithUv, None) => {
            log::warn!("textured layout requested without a texture, using colors");
            (LayoutPolicy::WithColor, None)
        }
        (LayoutPolicy::WithColor, Some(image)) => {
            log::warn!(
                "color layout requested, ignoring the {}x{} texture",
                image.width,
                image.height
            );
            (LayoutPolicy::WithColor, None)
        }
        (policy, texture) => (policy, texture),
    }
}

struct TransformBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
}

impl TransformBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, draws: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(size_of::<TransformUniform>() as u64, alignment);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Buffer"),
            size: stride * draws.max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size_of::<TransformUniform>() as u64),
                }),
            }],
            label: Some("transform_bind_group"),
        });
        Self {
            buffer,
            bind_group,
            stride,
        }
    }
}

struct UploadedScene {
    handle: SceneHandle<GpuMesh>,
    pipeline: ScenePipeline,
    texture_bind_group: Option<wgpu::BindGroup>,
    transforms: TransformBuffer,
}

#[derive(Default)]
pub struct SceneRenderer {
    options: BuildOptions,
    uploaded: Option<UploadedScene>,
}

impl SceneRenderer {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            uploaded: None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded.is_some()
    }

    /// The uploaded scene, if any.
    pub fn handle(&self) -> Option<&SceneHandle<GpuMesh>> {
        self.uploaded.as_ref().map(|u| &u.handle)
    }

    /// Uploads `scene` using the surface format of `ctx`.
    pub fn upload_scene(
        &mut self,
        ctx: &Context,
        scene: Arc<ImportedScene>,
        policy: LayoutPolicy,
        texture: Option<DecodedImage>,
    ) -> Result<()> {
        self.upload_with(
            &ctx.device,
            &ctx.queue,
            ctx.config.format,
            scene,
            policy,
            texture,
        )
    }

    /// Uploads meshes, builds the pipeline and creates the texture.
    ///
    /// A textured policy without an image is downgraded to the color layout, and
    /// every mesh buffer is checked against the pipeline's vertex layout.
    pub fn upload_with(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        scene: Arc<ImportedScene>,
        policy: LayoutPolicy,
        texture: Option<DecodedImage>,
    ) -> Result<()> {
        let (policy, texture) = settle_texture(policy, texture);

        let draws: usize = scene.nodes.iter().map(|n| n.meshes.len()).sum();
        let handle = upload_scene(
            scene,
            policy,
            self.options,
            &mut WgpuAllocator::new(device),
        )?;
        let pipeline = ScenePipeline::new(device, color_format, policy, self.options.winding)?;
        handle.check_layouts(&pipeline.vertex_layout)?;

        let texture_bind_group = match (&pipeline.texture_layout, texture) {
            (Some(layout), Some(image)) => {
                let texture = Texture::from_decoded(device, queue, image, "diffuse_texture")?;
                let sampler = texture
                    .sampler
                    .as_ref()
                    .ok_or_else(|| SceneError::InvalidImage("texture has no sampler".to_string()))?;
                Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                    label: Some("diffuse_bind_group"),
                }))
            }
            _ => None,
        };

        let transforms = TransformBuffer::new(device, &pipeline.transform_layout, draws);
        self.uploaded = Some(UploadedScene {
            handle,
            pipeline,
            texture_bind_group,
            transforms,
        });
        Ok(())
    }

    /// Draws the uploaded scene into the next surface texture and presents it.
    pub fn draw_frame(&self, ctx: &Context, root: Matrix4<f32>) -> Result<()> {
        if self.uploaded.is_none() {
            return Err(SceneError::NotUploaded);
        }
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to(
            &ctx.device,
            &ctx.queue,
            &view,
            &ctx.depth_texture.view,
            ctx.clear_colour,
            root,
        )?;
        output.present();
        Ok(())
    }

    /// Records and submits one frame into `color_view`. Returns the draw count.
    pub fn render_to(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear_colour: wgpu::Color,
        root: Matrix4<f32>,
    ) -> Result<usize> {
        let uploaded = self.uploaded.as_ref().ok_or(SceneError::NotUploaded)?;
        let list = traverse(
            &uploaded.handle,
            root,
            uploaded.texture_bind_group.is_some(),
        );
        let stride = uploaded.transforms.stride;
        if !list.is_empty() {
            queue.write_buffer(
                &uploaded.transforms.buffer,
                0,
                &pack_transforms(&list, stride),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&uploaded.pipeline.pipeline);
            for (i, draw) in list.iter().enumerate() {
                if let (Some(unit), Some(group)) =
                    (draw.texture_unit, &uploaded.texture_bind_group)
                {
                    // texture unit n lives in bind group n + 1
                    render_pass.set_bind_group(unit + 1, group, &[]);
                }
                let offset = (i as u64 * stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(0, &uploaded.transforms.bind_group, &[offset]);
                render_pass.draw_gpu_mesh(uploaded.handle.mesh(draw.mesh));
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        log::trace!("submitted {} draws", list.len());
        Ok(list.len())
    }
}
