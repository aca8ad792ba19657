//! Post-processing effect pipeline.
//!
//! The scene renders into an offscreen target, then a linear chain of named stages
//! (fullscreen fragment passes) runs in registration order and the last output is
//! presented. The chain is driven through a small control surface on
//! [`RenderPipeline`]: add, enable/disable, set parameter, resize.
//!
//! GPU work goes through [`GpuContext`]; the wgpu implementation lives in
//! [`crate::device`].

mod backend;
pub mod builtin;
mod error;
mod pipeline;
mod registry;
mod resize;
pub mod shader;
mod stage;
mod uniforms;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, GpuContext, TargetKind};
pub use error::{AddEffectError, CompileError, FrameError, ResourceError, ShaderStage};
pub use pipeline::{AnimationDriver, FrameOutcome, FrameStats, PipelineConfig, PipelineState, RenderPipeline};
pub use registry::{EffectEntry, EffectRegistry};
pub use resize::{Extent, RenderResources, ResizeCoordinator, ResizeOutcome};
pub use stage::{ShaderStageFactory, Stage, StageDefinition};
pub use uniforms::{UniformKind, UniformLayout, UniformValue, UniformWrite, Uniforms, UNIFORM_BUFFER_ALIGN};
