//! WGSL validation for stage sources.
//!
//! Both sources of a stage are parsed and validated with naga (the front end wgpu
//! itself uses) before any GPU object is created, so a bad source surfaces as a
//! [`CompileError`] instead of a device-level validation failure. The resources an
//! entry point uses are checked against the stage bind group as well.

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, GlobalVariable, ImageClass, ImageDimension, Module, Scalar, ScalarKind, TypeInner, VectorSize};

use super::error::{CompileError, ShaderStage};
use super::uniforms::{UniformKind, Uniforms};

/// Entry point every stage vertex source must expose.
pub const VERTEX_ENTRY: &str = "vs_main";

/// Entry point every stage fragment source must expose.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Stage bind group (group 0) slots. Only the fragment stage sees them.
pub const INPUT_TEXTURE_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;
pub const UNIFORM_BINDING: u32 = 2;

/// Parses and validates one source, and checks its entry point.
pub fn validate(effect: &str, shader: ShaderStage, source: &str) -> Result<(), CompileError> {
    parse(effect, shader, source).map(|_| ())
}

/// [`validate`], plus a check of every resource the entry point uses against the stage
/// bind group: `texture_2d<f32>` at 0, a filtering sampler at 1 and, at 2, a
/// `var<uniform>` struct whose fields match `uniforms` in order, type and offset.
pub fn validate_stage(
    effect: &str,
    shader: ShaderStage,
    source: &str,
    uniforms: &Uniforms,
) -> Result<(), CompileError> {
    let (module, info, entry) = parse(effect, shader, source)?;
    let fail = |message: String| CompileError::new(effect, shader, message);
    let used = info.get_entry_point(entry);

    for (handle, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if used[handle].is_empty() {
            continue;
        }

        let name = var.name.as_deref().unwrap_or("<unnamed>");
        let slot = format!("@group({}) @binding({})", binding.group, binding.binding);

        if shader == ShaderStage::Vertex {
            return Err(fail(format!("`{name}` at {slot}: vertex stages have no bound resources")));
        }
        if binding.group != 0 {
            return Err(fail(format!("`{name}` at {slot}: stages only have bind group 0")));
        }

        let inner = &module.types[var.ty].inner;
        match binding.binding {
            INPUT_TEXTURE_BINDING if is_sampled_2d(inner) => {}
            INPUT_TEXTURE_BINDING => {
                return Err(fail(format!("`{name}` at {slot} must be a texture_2d<f32>")));
            }
            SAMPLER_BINDING if matches!(inner, TypeInner::Sampler { comparison: false }) => {}
            SAMPLER_BINDING => return Err(fail(format!("`{name}` at {slot} must be a sampler"))),
            UNIFORM_BINDING => {
                check_uniform_block(&module, var, uniforms).map_err(|m| fail(format!("`{name}` at {slot}: {m}")))?
            }
            _ => return Err(fail(format!("`{name}` at {slot}: stages only bind slots 0..=2"))),
        }
    }

    Ok(())
}

/// Returns the module, its analysis and the index of the required entry point.
fn parse(effect: &str, shader: ShaderStage, source: &str) -> Result<(Module, ModuleInfo, usize), CompileError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| CompileError::new(effect, shader, e.emit_to_string(source)))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| CompileError::new(effect, shader, e.to_string()))?;

    let (entry, stage) = match shader {
        ShaderStage::Vertex => (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        ShaderStage::Fragment => (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    };

    let Some(index) = module.entry_points.iter().position(|ep| ep.name == entry && ep.stage == stage) else {
        return Err(CompileError::new(
            effect,
            shader,
            format!("missing {shader} entry point `{entry}`"),
        ));
    };

    Ok((module, info, index))
}

fn is_sampled_2d(inner: &TypeInner) -> bool {
    matches!(
        inner,
        TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class: ImageClass::Sampled { kind: ScalarKind::Float, multi: false },
        }
    )
}

fn check_uniform_block(module: &Module, var: &GlobalVariable, uniforms: &Uniforms) -> Result<(), String> {
    if var.space != AddressSpace::Uniform {
        return Err("must be declared var<uniform>".to_string());
    }
    let TypeInner::Struct { members, .. } = &module.types[var.ty].inner else {
        return Err("uniform block must be a struct".to_string());
    };
    if members.len() != uniforms.len() {
        return Err(format!("block has {} field(s), stage declares {}", members.len(), uniforms.len()));
    }

    let layout = uniforms.layout();
    for ((member, (key, value)), &offset) in members.iter().zip(uniforms.iter()).zip(&layout.offsets) {
        let (expected, wgsl) = match value.kind() {
            UniformKind::Scalar => (TypeInner::Scalar(Scalar::F32), "f32"),
            UniformKind::Vec2 => (
                TypeInner::Vector { size: VectorSize::Bi, scalar: Scalar::F32 },
                "vec2<f32>",
            ),
        };
        let field = member.name.as_deref().unwrap_or("<unnamed>");
        if module.types[member.ty].inner != expected {
            return Err(format!("field `{field}` holds `{key}` and must be {wgsl}"));
        }
        if member.offset as usize != offset {
            return Err(format!("field `{field}` is at byte {}, `{key}` is packed at {offset}", member.offset));
        }
    }
    Ok(())
}
