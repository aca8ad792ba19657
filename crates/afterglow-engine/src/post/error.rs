use std::fmt;

use super::resize::Extent;

/// Which of a stage's two shader sources an error refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A stage's shader source was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    /// Name of the effect whose stage failed to build.
    pub effect: String,
    pub shader: ShaderStage,
    pub message: String,
}

impl CompileError {
    pub(crate) fn new(effect: impl Into<String>, shader: ShaderStage, message: impl Into<String>) -> Self {
        Self { effect: effect.into(), shader, message: message.into() }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect `{}`: {} shader rejected: {}", self.effect, self.shader, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Failure of [`EffectRegistry::add`](super::EffectRegistry::add).
#[derive(Debug, Clone, PartialEq)]
pub enum AddEffectError {
    Compile(CompileError),
    /// An effect with this name is already registered. The existing entry is untouched.
    DuplicateName(String),
}

impl From<CompileError> for AddEffectError {
    fn from(err: CompileError) -> Self {
        AddEffectError::Compile(err)
    }
}

impl fmt::Display for AddEffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddEffectError::Compile(err) => err.fmt(f),
            AddEffectError::DuplicateName(name) => write!(f, "effect `{name}` is already registered"),
        }
    }
}

impl std::error::Error for AddEffectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AddEffectError::Compile(err) => Some(err),
            AddEffectError::DuplicateName(_) => None,
        }
    }
}

/// A render target could not be allocated.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The requested extent exceeds the device's 2D texture limit.
    TooLarge { label: &'static str, requested: Extent, max: u32 },
    /// The backend refused the allocation for another reason.
    Allocation { label: &'static str, message: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::TooLarge { label, requested, max } => write!(
                f,
                "{label}: {}x{} exceeds the maximum texture dimension {max}",
                requested.width, requested.height
            ),
            ResourceError::Allocation { label, message } => write!(f, "{label}: allocation failed: {message}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Fatal frame-cycle failure. The host is expected to stop scheduling frames.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Resource(ResourceError),
    /// A pipeline-owned target does not match the viewport.
    ExtentMismatch { target: &'static str, expected: Extent, found: Extent },
}

impl From<ResourceError> for FrameError {
    fn from(err: ResourceError) -> Self {
        FrameError::Resource(err)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Resource(err) => err.fmt(f),
            FrameError::ExtentMismatch { target, expected, found } => write!(
                f,
                "{target} is {}x{} but the viewport is {}x{}",
                found.width, found.height, expected.width, expected.height
            ),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Resource(err) => Some(err),
            FrameError::ExtentMismatch { .. } => None,
        }
    }
}
