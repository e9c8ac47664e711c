//! GPU textures and the decoded images they are created from.
//!
//! This module provides [`Texture`], a wrapper around a wgpu texture with its view
//! and sampler, and [`DecodedImage`], the raw pixels handed over by the image
//! decoder. The scene's diffuse texture is created once at load time with a full
//! mip chain, linear filtering and clamp-to-edge wrapping.

use image::{RgbaImage, imageops::FilterType};

use crate::error::{Result, SceneError};

/// Raw pixels as returned by the image decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 1 (grey), 2 (grey + alpha), 3 (rgb) or 4 (rgba)
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Checks that the buffer is non-empty and holds exactly
    /// `width * height * channels` bytes.
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.channels) {
            return Err(SceneError::InvalidImage(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return Err(SceneError::InvalidImage(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        if self.pixels.len() != expected {
            return Err(SceneError::InvalidImage(format!(
                "{}x{}x{} needs {} bytes, got {}",
                self.width,
                self.height,
                self.channels,
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Expands the pixels to RGBA8, consuming the decoded buffer.
    pub fn into_rgba8(self) -> Result<RgbaImage> {
        self.validate()?;
        let rgba: Vec<u8> = match self.channels {
            4 => self.pixels,
            3 => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            2 => self
                .pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            _ => self.pixels.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        };
        RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| SceneError::InvalidImage("pixel buffer too small".to_string()))
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// The base image followed by every successively halved level.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let prev = &chain[chain.len() - 1];
        let width = (prev.width() / 2).max(1);
        let height = (prev.height() / 2).max(1);
        let next = image::imageops::resize(prev, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Upload a decoded image with its full mip chain.
    ///
    /// The decoded pixels are consumed here and released as soon as the last
    /// mip level has been written to the queue.
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: DecodedImage,
        label: &str,
    ) -> Result<Self> {
        let chain = mip_chain(image.into_rgba8()?);
        let (width, height) = chain[0].dimensions();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: chain.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in chain.iter().enumerate() {
            let (w, h) = mip.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                mip.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }
        log::debug!("uploaded texture {label} {width}x{height} with {} mips", chain.len());

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_clamped_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// Linear filtering on every axis and mip level, clamped at the edges.
pub fn create_clamped_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("scene texture sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
