//! Recording GPU context for tests. Executes nothing; logs what the pipeline asked for.

use std::collections::HashMap;

use super::backend::{Backend, GpuContext, TargetKind};
use super::error::{CompileError, ResourceError, ShaderStage};
use super::resize::Extent;
use super::uniforms::UniformLayout;

pub(crate) struct Recording;

#[derive(Debug)]
pub(crate) struct MockTarget {
    pub id: usize,
    pub extent: Extent,
}

#[derive(Debug)]
pub(crate) struct MockProgram {
    pub effect: String,
    pub uniform_size: usize,
}

/// One recorded GPU operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    Scene { target: usize },
    Stage { effect: String, input_from: String, output: usize },
    Present { from: String },
}

/// Frame log. Tracks which producer last wrote each target.
#[derive(Debug, Default)]
pub(crate) struct MockFrame {
    pub ops: Vec<Op>,
    writers: HashMap<usize, String>,
}

impl MockFrame {
    /// Called from the scene closure.
    pub fn record_scene(&mut self, target: &MockTarget) {
        self.writers.insert(target.id, "scene".to_string());
        self.ops.push(Op::Scene { target: target.id });
    }

    fn writer(&self, target: &MockTarget) -> String {
        self.writers.get(&target.id).cloned().unwrap_or_else(|| "<unwritten>".to_string())
    }

    /// Effects executed this frame, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Stage { effect, .. } => Some(effect.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(effect, producer of its input)` pairs in execution order.
    pub fn inputs(&self) -> Vec<(&str, &str)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Stage { effect, input_from, .. } => Some((effect.as_str(), input_from.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Producer of the presented image.
    pub fn presented(&self) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Present { from } => Some(from.as_str()),
            _ => None,
        })
    }
}

impl Backend for Recording {
    type Target = MockTarget;
    type Program = MockProgram;
    type Frame = MockFrame;

    fn target_extent(target: &MockTarget) -> Extent {
        target.extent
    }
}

pub(crate) struct RecordingGpu {
    /// Last recorded size, empty while minimized.
    pub surface: Extent,
    /// Size the surface was last configured at; never empty.
    pub configured: Extent,
    /// Number of surface reconfigurations.
    pub reconfigures: usize,
    pub max_dimension: u32,
    /// Effect names whose fragment source the "driver" rejects.
    pub reject: Vec<String>,
    pub allocations: Vec<(&'static str, TargetKind, Extent)>,
    pub compiled: Vec<String>,
    pub uploads: Vec<(String, Vec<u8>)>,
    next_id: usize,
}

impl RecordingGpu {
    pub fn new(surface: Extent) -> Self {
        Self {
            surface,
            configured: surface,
            reconfigures: 0,
            max_dimension: 8192,
            reject: Vec::new(),
            allocations: Vec::new(),
            compiled: Vec::new(),
            uploads: Vec::new(),
            next_id: 0,
        }
    }
}

impl GpuContext<Recording> for RecordingGpu {
    fn surface_extent(&self) -> Extent {
        self.surface
    }

    fn resize_surface(&mut self, extent: Extent) {
        self.surface = extent;
        if !extent.is_empty() {
            self.configured = extent;
            self.reconfigures += 1;
        }
    }

    fn create_target(
        &mut self,
        label: &'static str,
        kind: TargetKind,
        extent: Extent,
    ) -> Result<MockTarget, ResourceError> {
        if extent.width > self.max_dimension || extent.height > self.max_dimension {
            return Err(ResourceError::TooLarge { label, requested: extent, max: self.max_dimension });
        }
        self.allocations.push((label, kind, extent));
        self.next_id += 1;
        Ok(MockTarget { id: self.next_id, extent })
    }

    fn compile_stage(
        &mut self,
        effect: &str,
        _vertex_source: &str,
        _fragment_source: &str,
        layout: &UniformLayout,
    ) -> Result<MockProgram, CompileError> {
        if self.reject.iter().any(|r| r == effect) {
            return Err(CompileError::new(effect, ShaderStage::Fragment, "rejected by driver"));
        }
        self.compiled.push(effect.to_string());
        Ok(MockProgram { effect: effect.to_string(), uniform_size: layout.size })
    }

    fn write_uniforms(&mut self, program: &MockProgram, bytes: &[u8]) {
        assert_eq!(bytes.len(), program.uniform_size);
        self.uploads.push((program.effect.clone(), bytes.to_vec()));
    }

    fn run_stage(&mut self, frame: &mut MockFrame, program: &MockProgram, input: &MockTarget, output: &MockTarget) {
        assert_ne!(input.id, output.id, "stage reads and writes the same target");
        let input_from = frame.writer(input);
        frame.writers.insert(output.id, program.effect.clone());
        frame.ops.push(Op::Stage { effect: program.effect.clone(), input_from, output: output.id });
    }

    fn present(&mut self, frame: &mut MockFrame, source: &MockTarget) {
        let from = frame.writer(source);
        frame.ops.push(Op::Present { from });
    }
}
