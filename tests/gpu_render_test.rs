#![cfg(feature = "integration-tests")]

use std::{path::PathBuf, sync::Arc};

use cgmath::Matrix4;
use scene_ngin::{
    SceneError,
    data_structures::{
        texture::{DecodedImage, Texture},
        transform,
        vertex::{BuildOptions, LayoutPolicy, WindingOrder},
    },
    renderer::SceneRenderer,
    resources::{ImportFlags, import_scene},
};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let runtime = tokio::runtime::Builder::new_current_thread().build().ok()?;
    runtime.block_on(async {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}

fn target(device: &wgpu::Device) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: wgpu::Extent3d {
                width: 256,
                height: 256,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn checker() -> DecodedImage {
    DecodedImage {
        width: 2,
        height: 2,
        channels: 3,
        pixels: vec![255, 255, 255, 0, 0, 0, 0, 0, 0, 255, 255, 255],
    }
}

#[test]
fn textured_hierarchy_renders_one_draw_per_mesh_reference() {
    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/hierarchy.gltf");
    let scene = Arc::new(import_scene(&path, ImportFlags::TARGET_REALTIME).unwrap());

    let mut renderer = SceneRenderer::new(BuildOptions::default());
    renderer
        .upload_with(
            &device,
            &queue,
            TARGET_FORMAT,
            scene,
            LayoutPolicy::WithUv,
            Some(checker()),
        )
        .unwrap();

    let color = target(&device);
    let depth = Texture::create_depth_texture(&device, [256, 256], "test depth");
    let root = transform::view_projection(1.0, 3.0) * transform::uniform_scale(0.5);
    let draws = renderer
        .render_to(&device, &queue, &color, &depth.view, wgpu::Color::BLACK, root)
        .unwrap();
    assert_eq!(draws, 2);
}

#[test]
fn reversed_winding_builds_a_clockwise_pipeline() {
    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/cube.obj");
    let scene = Arc::new(import_scene(&path, ImportFlags::TARGET_REALTIME).unwrap());

    let mut renderer = SceneRenderer::new(BuildOptions {
        winding: WindingOrder::Reversed,
        ..Default::default()
    });
    renderer
        .upload_with(&device, &queue, TARGET_FORMAT, scene, LayoutPolicy::WithColor, None)
        .unwrap();
    assert_eq!(renderer.handle().map(|h| h.meshes().len()), Some(1));

    let color = target(&device);
    let depth = Texture::create_depth_texture(&device, [256, 256], "test depth");
    let draws = renderer
        .render_to(&device, &queue, &color, &depth.view, wgpu::Color::WHITE, Matrix4::from_scale(0.5))
        .unwrap();
    assert_eq!(draws, 1);
}

#[test]
fn rendering_before_upload_is_an_error() {
    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let renderer = SceneRenderer::default();
    let color = target(&device);
    let depth = Texture::create_depth_texture(&device, [256, 256], "test depth");
    let result = renderer.render_to(
        &device,
        &queue,
        &color,
        &depth.view,
        wgpu::Color::BLACK,
        Matrix4::from_scale(1.0),
    );
    assert!(matches!(result, Err(SceneError::NotUploaded)));
}
