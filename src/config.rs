use std::path::PathBuf;

use crate::{
    data_structures::vertex::{BuildOptions, LayoutPolicy, ReservedFill},
    resources::{ImportFlags, texture::DecodeFailurePolicy},
};

/// Everything the viewer needs to load and show one scene.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Scene file, absolute, relative to the working directory or relative to
    /// `asset_root`.
    pub scene: String,
    /// Diffuse texture, absolute or relative to `asset_root`.
    pub texture: Option<String>,
    pub asset_root: PathBuf,
    pub import_flags: ImportFlags,
    pub layout: LayoutPolicy,
    pub build: BuildOptions,
    pub on_decode_failure: DecodeFailurePolicy,
    pub clear_colour: wgpu::Color,
    /// Degrees per second around the Y axis.
    pub spin_speed: f32,
    /// Uniform scale applied at the root, never baked into vertex data.
    pub scale: f32,
    pub camera_distance: f32,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene: "cube.obj".to_string(),
            texture: None,
            asset_root: PathBuf::from(env!("SCENE_NGIN_ASSET_DIR")),
            import_flags: ImportFlags::TARGET_REALTIME,
            layout: LayoutPolicy::WithUv,
            build: BuildOptions {
                reserved: ReservedFill::RandomColor,
                ..Default::default()
            },
            on_decode_failure: DecodeFailurePolicy::Abort,
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
            spin_speed: 45.0,
            scale: 0.5,
            camera_distance: 3.0,
            title: "scene-ngin".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl ViewerConfig {
    /// Fills the config from positional arguments: `[scene] [texture]`.
    ///
    /// Without arguments the bundled cube is shown.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let mut args = args.into_iter();
        if let Some(scene) = args.next() {
            config.scene = scene;
        }
        config.texture = args.next();
        if let Some(extra) = args.next() {
            anyhow::bail!("unexpected argument {extra:?}, usage: scene-viewer [scene] [texture]");
        }
        Ok(config)
    }
}
