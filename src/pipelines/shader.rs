//! WGSL front-end checks run before a shader reaches wgpu.
//!
//! [`compile`] parses and validates the source with naga and reports failures
//! as [`SceneError::Compile`] with the diagnostic rendered against the source.
//! [`link`] checks the validated module against the pipeline it is going into:
//! both entry points exist, every vertex input location is provided by the
//! [`VertexLayout`] and every resource binding is one the pipeline layout
//! declares. Mismatches are reported as [`SceneError::Link`].

use naga::{
    Binding, Module, ShaderStage, TypeInner,
    valid::{Capabilities, ValidationFlags, Validator},
};

use crate::{
    data_structures::vertex::VertexLayout,
    error::{Result, SceneError},
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// `(group, binding)` of the per-draw transform uniform.
pub const TRANSFORM_BINDING: (u32, u32) = (0, 0);
/// `(group, binding)` of the diffuse texture view and its sampler.
pub const TEXTURE_BINDINGS: [(u32, u32); 2] = [(1, 0), (1, 1)];

/// A WGSL source that passed both [`compile`] and [`link`].
#[derive(Debug)]
pub struct CheckedShader {
    pub label: String,
    pub source: String,
}

impl CheckedShader {
    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        })
    }
}

/// Parses and validates `source`.
pub fn compile(label: &str, source: &str) -> Result<Module> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| SceneError::Compile {
        label: label.to_string(),
        reason: e.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| SceneError::Compile {
            label: label.to_string(),
            reason: e.emit_to_string(source),
        })?;
    Ok(module)
}

/// Checks that `module` fits a pipeline with `layout` vertices and, if
/// `textured`, the diffuse texture bind group.
pub fn link(label: &str, module: &Module, layout: &VertexLayout, textured: bool) -> Result<()> {
    let link_error = |reason: String| SceneError::Link {
        label: label.to_string(),
        reason,
    };

    let vertex = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Vertex && ep.name == VERTEX_ENTRY)
        .ok_or_else(|| link_error(format!("no @vertex entry point named {}", VERTEX_ENTRY)))?;
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.stage == ShaderStage::Fragment && ep.name == FRAGMENT_ENTRY)
    {
        return Err(link_error(format!(
            "no @fragment entry point named {}",
            FRAGMENT_ENTRY
        )));
    }

    for location in vertex_input_locations(module, &vertex.function) {
        if layout.attribute(location).is_none() {
            return Err(link_error(format!(
                "vertex input @location({}) is not provided by the vertex layout",
                location
            )));
        }
    }

    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else {
            continue;
        };
        let slot = (binding.group, binding.binding);
        let declared = slot == TRANSFORM_BINDING || (textured && TEXTURE_BINDINGS.contains(&slot));
        if !declared {
            return Err(link_error(format!(
                "@group({}) @binding({}) is not part of the pipeline layout",
                slot.0, slot.1
            )));
        }
    }
    Ok(())
}

fn vertex_input_locations(module: &Module, function: &naga::Function) -> Vec<u32> {
    let mut locations = Vec::new();
    for argument in &function.arguments {
        match &argument.binding {
            Some(Binding::Location { location, .. }) => locations.push(*location),
            Some(Binding::BuiltIn(_)) => {}
            None => {
                if let TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    locations.extend(members.iter().filter_map(|m| match &m.binding {
                        Some(Binding::Location { location, .. }) => Some(*location),
                        _ => None,
                    }));
                }
            }
        }
    }
    locations
}

/// Runs [`compile`] and [`link`], logging the outcome.
pub fn check(
    label: &str,
    source: &str,
    layout: &VertexLayout,
    textured: bool,
) -> Result<CheckedShader> {
    let module = compile(label, source).inspect_err(|e| log::error!("{e}"))?;
    link(label, &module, layout, textured).inspect_err(|e| log::error!("{e}"))?;
    log::debug!("shader {label} compiled and linked");
    Ok(CheckedShader {
        label: label.to_string(),
        source: source.to_string(),
    })
}
