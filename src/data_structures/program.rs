//! Shader programs: a vertex and a fragment WGSL module plus the attribute names bound to the
//! vertex inputs.
//!
//! WGPU has no separate link step, so [`link`] performs one up front: both sources are parsed
//! and validated with naga, the `vs_main`/`fs_main` entry points must exist, and every vertex
//! input location must have an attribute bound to it. Attribute `i` binds `@location(i)`.
//! Validating before `create_shader_module` means a broken shader is reported as an error for
//! its asset instead of reaching the device's uncaptured-error handler.

use anyhow::{Context as _, Result, anyhow, bail};
use naga::{
    ShaderStage,
    valid::{Capabilities, ValidationFlags, Validator},
};

use crate::backend::Resource;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Attribute bindings of a linked program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    attributes: Vec<String>,
    vertex_inputs: Vec<u32>,
}

impl ProgramLayout {
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The vertex input location `name` is bound to.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .position(|attribute| attribute == name)
            .map(|index| index as u32)
    }

    /// Locations the vertex entry point actually reads, ascending.
    pub fn vertex_inputs(&self) -> &[u32] {
        &self.vertex_inputs
    }
}

/// Validates a vertex/fragment pair and binds `attributes` to the vertex inputs.
pub fn link(
    vertex_source: &str,
    fragment_source: &str,
    attributes: &[String],
) -> Result<ProgramLayout> {
    let vertex = compile(vertex_source).context("vertex shader failed to compile")?;
    let fragment = compile(fragment_source).context("fragment shader failed to compile")?;

    let entry = entry_point(&vertex, ShaderStage::Vertex, VERTEX_ENTRY_POINT)?;
    entry_point(&fragment, ShaderStage::Fragment, FRAGMENT_ENTRY_POINT)?;

    for (index, attribute) in attributes.iter().enumerate() {
        if attributes[..index].contains(attribute) {
            bail!("attribute `{}` is bound more than once", attribute);
        }
    }

    let mut vertex_inputs = vertex_input_locations(&vertex, entry);
    vertex_inputs.sort_unstable();
    vertex_inputs.dedup();
    if let Some(unbound) = vertex_inputs
        .iter()
        .find(|location| **location as usize >= attributes.len())
    {
        bail!(
            "vertex input @location({}) has no attribute bound to it ({} attribute(s) given)",
            unbound,
            attributes.len()
        );
    }

    Ok(ProgramLayout {
        attributes: attributes.to_vec(),
        vertex_inputs,
    })
}

fn compile(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!(e.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| anyhow!(e.emit_to_string(source)))?;
    Ok(module)
}

fn entry_point<'a>(
    module: &'a naga::Module,
    stage: ShaderStage,
    name: &str,
) -> Result<&'a naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == name)
        .ok_or_else(|| anyhow!("missing {:?} entry point `{}`", stage, name))
}

fn vertex_input_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut locations = Vec::new();
    for argument in &entry.function.arguments {
        match &argument.binding {
            Some(naga::Binding::Location { location, .. }) => locations.push(*location),
            Some(_) => {}
            // Inputs grouped in a struct carry their bindings on the members.
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    locations.extend(members.iter().filter_map(|member| match &member.binding {
                        Some(naga::Binding::Location { location, .. }) => Some(*location),
                        _ => None,
                    }));
                }
            }
        }
    }
    locations
}

/// A linked shader program on the GPU.
#[derive(Debug)]
pub struct Program {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    layout: ProgramLayout,
}

impl Program {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &[String],
    ) -> Result<Self> {
        let layout = link(vertex_source, fragment_source, attributes)?;

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} (vertex)", label)),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} (fragment)", label)),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });

        Ok(Self {
            vertex,
            fragment,
            layout,
        })
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.layout.attribute_location(name)
    }

    pub fn vertex_state<'a>(
        &'a self,
        buffers: &'a [wgpu::VertexBufferLayout<'a>],
    ) -> wgpu::VertexState<'a> {
        wgpu::VertexState {
            module: &self.vertex,
            entry_point: Some(VERTEX_ENTRY_POINT),
            buffers,
            compilation_options: Default::default(),
        }
    }

    pub fn fragment_state<'a>(
        &'a self,
        targets: &'a [Option<wgpu::ColorTargetState>],
    ) -> wgpu::FragmentState<'a> {
        wgpu::FragmentState {
            module: &self.fragment,
            entry_point: Some(FRAGMENT_ENTRY_POINT),
            targets,
            compilation_options: Default::default(),
        }
    }
}

impl Resource for Program {
    // Shader modules are released when dropped.
    fn dispose(self) {}
}
