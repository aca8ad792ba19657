//! GPU context contract consumed by the post-processing pipeline.
//!
//! `Backend` names the resource types; `GpuContext` performs the work. Splitting the two
//! lets the pipeline own targets and programs without borrowing the device that made
//! them, which matters because the wgpu device lives inside the window runtime.

use super::error::{CompileError, ResourceError};
use super::resize::Extent;
use super::uniforms::UniformLayout;

/// Resource types produced by one GPU implementation.
pub trait Backend {
    /// Offscreen color target (optionally with depth).
    type Target;
    /// Compiled stage program plus its uniform storage.
    type Program;
    /// Per-frame recording state (encoder, acquired surface image).
    type Frame;

    fn target_extent(target: &Self::Target) -> Extent;
}

/// What an offscreen target is used for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetKind {
    /// Receives the scene render; carries a depth attachment.
    Scene,
    /// Stage output buffer; color only.
    Stage,
}

/// Operations the pipeline needs from a GPU context.
pub trait GpuContext<B: Backend> {
    /// Last size recorded for the visible surface, empty while minimized.
    fn surface_extent(&self) -> Extent;

    /// Records `extent` as the surface size and reconfigures the surface when it is
    /// non-empty. An empty extent leaves the previous configuration in place.
    fn resize_surface(&mut self, extent: Extent);

    fn create_target(
        &mut self,
        label: &'static str,
        kind: TargetKind,
        extent: Extent,
    ) -> Result<B::Target, ResourceError>;

    /// Builds a program from already validated WGSL sources.
    fn compile_stage(
        &mut self,
        effect: &str,
        vertex_source: &str,
        fragment_source: &str,
        layout: &UniformLayout,
    ) -> Result<B::Program, CompileError>;

    /// Replaces the program's uniform buffer contents.
    fn write_uniforms(&mut self, program: &B::Program, bytes: &[u8]);

    /// Runs `program` reading `input` and writing all of `output`.
    fn run_stage(
        &mut self,
        frame: &mut B::Frame,
        program: &B::Program,
        input: &B::Target,
        output: &B::Target,
    );

    /// Copies `source` to the visible surface.
    fn present(&mut self, frame: &mut B::Frame, source: &B::Target);
}
