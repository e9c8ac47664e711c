use std::path::Path;

use crate::{
    data_structures::{texture::DecodedImage, vertex::LayoutPolicy},
    error::{Result, SceneError},
};

/// What to do when the scene texture cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
    /// Fail the scene load with the decode error.
    #[default]
    Abort,
    /// Log a warning and render the scene untextured.
    Untextured,
}

/// Bind group layout for the diffuse texture: view at binding 0, sampler at 1.
pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("diffuse_texture_bind_group_layout"),
    })
}

/// Decodes an image file into raw 8-bit pixels, keeping its channel count.
pub fn decode_image(path: &Path) -> Result<DecodedImage> {
    let decode_error = |reason: String| SceneError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let img = image::open(path).map_err(|e| decode_error(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    let (channels, pixels) = match img.color().channel_count() {
        1 => (1, img.into_luma8().into_raw()),
        2 => (2, img.into_luma_alpha8().into_raw()),
        3 => (3, img.into_rgb8().into_raw()),
        _ => (4, img.into_rgba8().into_raw()),
    };
    let decoded = DecodedImage {
        width,
        height,
        channels,
        pixels,
    };
    decoded
        .validate()
        .map_err(|e| decode_error(e.to_string()))?;
    Ok(decoded)
}

/// Settles the layout a scene is uploaded with, given its texture decode result.
///
/// A color layout never needs the image. A UV layout keeps the image on success;
/// on failure `policy` decides between propagating the error and falling back
/// to the untextured color layout.
pub fn apply_decode_policy(
    decoded: Result<DecodedImage>,
    policy: DecodeFailurePolicy,
    requested: LayoutPolicy,
) -> Result<(Option<DecodedImage>, LayoutPolicy)> {
    if !requested.is_textured() {
        return Ok((None, requested));
    }
    match (decoded, policy) {
        (Ok(image), _) => Ok((Some(image), requested)),
        (Err(e), DecodeFailurePolicy::Abort) => Err(e),
        (Err(e), DecodeFailurePolicy::Untextured) => {
            log::warn!("rendering untextured: {e}");
            Ok((None, LayoutPolicy::WithColor))
        }
    }
}

/// Loads the scene texture for `requested`, if any.
///
/// Without a texture path a UV layout falls back to the color layout.
pub fn load_scene_texture(
    path: Option<&Path>,
    policy: DecodeFailurePolicy,
    requested: LayoutPolicy,
) -> Result<(Option<DecodedImage>, LayoutPolicy)> {
    match path {
        Some(path) if requested.is_textured() => {
            apply_decode_policy(decode_image(path), policy, requested)
        }
        Some(_) => Ok((None, requested)),
        None if requested.is_textured() => {
            log::info!("no texture given, using the color layout");
            Ok((None, LayoutPolicy::WithColor))
        }
        None => Ok((None, requested)),
    }
}
