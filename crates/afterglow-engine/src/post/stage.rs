//! Post-processing stages and the factory that builds them.

use std::borrow::Cow;

use super::backend::{Backend, GpuContext};
use super::error::{CompileError, ShaderStage};
use super::shader;
use super::uniforms::{UniformValue, UniformWrite, Uniforms};

/// Source description of a stage: WGSL for both shader stages and its uniforms in
/// declaration order.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub vertex_source: Cow<'static, str>,
    pub fragment_source: Cow<'static, str>,
    pub uniforms: Uniforms,
}

impl StageDefinition {
    pub fn new(
        vertex_source: impl Into<Cow<'static, str>>,
        fragment_source: impl Into<Cow<'static, str>>,
        uniforms: Uniforms,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            uniforms,
        }
    }
}

/// A compiled stage with its own live uniform state.
pub struct Stage<P> {
    program: P,
    uniforms: Uniforms,
    enabled: bool,
    // Uniform buffer needs re-upload before the next run.
    dirty: bool,
}

impl<P> Stage<P> {
    #[inline]
    pub fn program(&self) -> &P {
        &self.program
    }

    #[inline]
    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn write_uniform(&mut self, name: &str, value: UniformValue) -> UniformWrite {
        let result = self.uniforms.set(name, value);
        if result == UniformWrite::Written {
            self.dirty = true;
        }
        result
    }

    /// Returns whether the uniforms changed since the last call, and clears the flag.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Builds [`Stage`]s from [`StageDefinition`]s.
pub struct ShaderStageFactory;

impl ShaderStageFactory {
    /// Validates `def` against the stage bind group, then compiles it.
    ///
    /// The stage gets its own copy of the uniforms, so later changes to `def` do not
    /// reach it.
    pub fn create<B, G>(gpu: &mut G, effect: &str, def: &StageDefinition) -> Result<Stage<B::Program>, CompileError>
    where
        B: Backend,
        G: GpuContext<B>,
    {
        shader::validate_stage(effect, ShaderStage::Vertex, &def.vertex_source, &def.uniforms)?;
        shader::validate_stage(effect, ShaderStage::Fragment, &def.fragment_source, &def.uniforms)?;

        let uniforms = def.uniforms.clone();
        let program = gpu.compile_stage(effect, &def.vertex_source, &def.fragment_source, &uniforms.layout())?;

        Ok(Stage { program, uniforms, enabled: true, dirty: true })
    }
}
