//! Stage uniform values and their GPU buffer layout.

use bytemuck::cast_slice;

/// A value carried by a stage uniform.
///
/// Closed set: shaders only see scalars and 2-component vectors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2([f32; 2]),
}

/// Shape of a [`UniformValue`], used to reject writes that would change a field's type.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Scalar,
    Vec2,
}

impl UniformValue {
    #[inline]
    pub fn kind(self) -> UniformKind {
        match self {
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Vec2(_) => UniformKind::Vec2,
        }
    }

    /// Returns the scalar, if this is one.
    #[inline]
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            UniformValue::Scalar(v) => Some(v),
            UniformValue::Vec2(_) => None,
        }
    }
}

impl UniformKind {
    // WGSL uniform address space: f32 is 4/4, vec2<f32> is 8/8 (align/size).
    #[inline]
    fn align(self) -> usize {
        match self {
            UniformKind::Scalar => 4,
            UniformKind::Vec2 => 8,
        }
    }

    #[inline]
    fn size(self) -> usize {
        self.align()
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Scalar(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<glam::Vec2> for UniformValue {
    fn from(v: glam::Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

/// Result of writing into a [`Uniforms`] map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformWrite {
    Written,
    /// The key is not declared; nothing changed.
    UnknownKey,
    /// The key exists with a different kind; nothing changed.
    KindMismatch,
}

/// Ordered name → value map.
///
/// Declaration order is significant: it is the field order of the WGSL uniform struct
/// the stage's fragment shader declares at `@group(0) @binding(2)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    entries: Vec<(String, UniformValue)>,
}

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Uniforms::declare`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.declare(name, value);
        self
    }

    /// Declares `name`, or replaces its value in place if already declared.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Overwrites an already declared key. Never inserts.
    pub fn set(&mut self, name: &str, value: UniformValue) -> UniformWrite {
        let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == name) else {
            return UniformWrite::UnknownKey;
        };
        if slot.1.kind() != value.kind() {
            return UniformWrite::KindMismatch;
        }
        slot.1 = value;
        UniformWrite::Written
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes field offsets and the buffer size for the current declarations.
    pub fn layout(&self) -> UniformLayout {
        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut cursor = 0usize;
        for (_, value) in &self.entries {
            let kind = value.kind();
            cursor = align_up(cursor, kind.align());
            offsets.push(cursor);
            cursor += kind.size();
        }
        UniformLayout {
            offsets,
            size: align_up(cursor, UNIFORM_BUFFER_ALIGN).max(UNIFORM_BUFFER_ALIGN),
        }
    }

    /// Packs all values into a byte buffer matching [`Uniforms::layout`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut bytes = vec![0u8; layout.size];
        for ((_, value), &offset) in self.entries.iter().zip(&layout.offsets) {
            match value {
                UniformValue::Scalar(v) => {
                    bytes[offset..offset + 4].copy_from_slice(bytemuck::bytes_of(v));
                }
                UniformValue::Vec2(v) => {
                    bytes[offset..offset + 8].copy_from_slice(cast_slice(v.as_slice()));
                }
            }
        }
        bytes
    }
}

/// Uniform buffers are sized in multiples of 16 bytes and never empty.
pub const UNIFORM_BUFFER_ALIGN: usize = 16;

/// Byte layout of a [`Uniforms`] map.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformLayout {
    /// Byte offset of each field, in declaration order.
    pub offsets: Vec<usize>,
    /// Total buffer size in bytes.
    pub size: usize,
}

#[inline]
fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
