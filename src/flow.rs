//! Application event loop for the scene viewer.
//!
//! [`run`] imports the scene and its texture, opens a window and hands control
//! to winit. The GPU context is created once the window exists; from then on
//! every redraw spins the scene a little further and draws it.
//!
//! # Lifecycle
//!
//! 1. Import the scene and settle the vertex layout against the texture
//! 2. `resumed`: create window and context, upload the scene
//! 3. `RedrawRequested`: compose the root transform, traverse, draw, present
//! 4. Escape or a close request ends the loop

use std::sync::Arc;

use cgmath::Matrix4;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::{scene::ImportedScene, texture::DecodedImage, transform, vertex::LayoutPolicy},
    error::SceneError,
    renderer::SceneRenderer,
    resources::{self, texture::load_scene_texture},
};

/// A scene that is imported and ready for upload.
pub struct LoadedScene {
    pub scene: Arc<ImportedScene>,
    pub texture: Option<DecodedImage>,
    pub layout: LayoutPolicy,
}

/// Imports the scene and texture named by `config`.
pub fn load(config: &ViewerConfig) -> Result<LoadedScene, SceneError> {
    let scene_path = resources::resolve_asset(&config.asset_root, &config.scene);
    let scene = resources::import_scene(&scene_path, config.import_flags)?;
    let texture_path = config
        .texture
        .as_deref()
        .map(|t| resources::resolve_asset(&config.asset_root, t));
    let (texture, layout) = load_scene_texture(
        texture_path.as_deref(),
        config.on_decode_failure,
        config.layout,
    )?;
    Ok(LoadedScene {
        scene: Arc::new(scene),
        texture,
        layout,
    })
}

/// Root transform at `seconds` into the run: camera and projection, then the
/// demo spin and scale.
pub fn root_transform(config: &ViewerConfig, aspect: f32, seconds: f32) -> Matrix4<f32> {
    transform::view_projection(aspect, config.camera_distance)
        * transform::spin(seconds, config.spin_speed, config.scale)
}

struct AppState {
    ctx: Context,
    renderer: SceneRenderer,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, config: &ViewerConfig, seconds: f32) -> Result<(), SceneError> {
        self.ctx.window.request_redraw();
        if !self.is_surface_configured {
            return Ok(());
        }
        let root = root_transform(config, self.ctx.aspect(), seconds);
        self.renderer.draw_frame(&self.ctx, root)
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: ViewerConfig,
    pending: Option<LoadedScene>,
    state: Option<AppState>,
    started: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig, loaded: LoadedScene) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Builder::new_current_thread().build()?;
        Ok(Self {
            async_runtime,
            config,
            pending: Some(loaded),
            state: None,
            started: Instant::now(),
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let Some(loaded) = self.pending.take() else {
            return Ok(());
        };
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let ctx = self
            .async_runtime
            .block_on(Context::new(window, self.config.clear_colour))?;
        let mut renderer = SceneRenderer::new(self.config.build);
        renderer.upload_scene(&ctx, loaded.scene, loaded.layout, loaded.texture)?;

        let size = ctx.window.inner_size();
        let mut state = AppState {
            ctx,
            renderer,
            is_surface_configured: false,
        };
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.started = Instant::now();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.init(event_loop) {
            log::error!("viewer setup failed: {e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let seconds = self.started.elapsed().as_secs_f32();
                match state.render(&self.config, seconds) {
                    Ok(()) => {}
                    Err(SceneError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Loads the configured scene and runs the viewer until the window closes.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let loaded = load(&config)?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, loaded)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;

    #[test]
    fn root_transform_scales_before_projecting() {
        let config = ViewerConfig::default();
        let near = root_transform(&config, 1.0, 0.0) * Vector4::new(1.0, 0.0, 0.0, 1.0);
        let expected = transform::view_projection(1.0, config.camera_distance)
            * Vector4::new(0.5, 0.0, 0.0, 1.0);
        assert!((near - expected).x.abs() < 1e-6);
        assert!((near - expected).w.abs() < 1e-6);
    }

    #[test]
    fn missing_scene_fails_before_any_window() {
        let config = ViewerConfig {
            scene: "definitely-missing.obj".to_string(),
            asset_root: std::env::temp_dir(),
            ..Default::default()
        };
        assert!(matches!(load(&config), Err(SceneError::Import { .. })));
    }
}
