//! Built-in stage definitions: bright-pass bloom and a separable directional blur.

use super::stage::StageDefinition;
use super::uniforms::Uniforms;

pub const FULLSCREEN_VERTEX: &str = include_str!("shaders/fullscreen.wgsl");
pub const BLOOM_FRAGMENT: &str = include_str!("shaders/bloom.wgsl");
pub const BLUR_FRAGMENT: &str = include_str!("shaders/blur.wgsl");

/// Bright-pass: `uIntensity`, `uBrightnessThreshold`.
pub fn bloom() -> StageDefinition {
    StageDefinition::new(
        FULLSCREEN_VERTEX,
        BLOOM_FRAGMENT,
        Uniforms::new()
            .with("uIntensity", 1.0_f32)
            .with("uBrightnessThreshold", 0.2_f32),
    )
}

/// One blur pass: `uDirection`, `uBlurAmount`, `uIntensity`.
///
/// Register it twice with [`horizontal`] and [`vertical`] overrides for a full 2D blur.
pub fn directional_blur() -> StageDefinition {
    StageDefinition::new(
        FULLSCREEN_VERTEX,
        BLUR_FRAGMENT,
        Uniforms::new()
            .with("uDirection", [1.0_f32, 0.0])
            .with("uBlurAmount", 1.8_f32)
            .with("uIntensity", 1.5_f32),
    )
}

pub fn horizontal() -> Uniforms {
    Uniforms::new().with("uDirection", [1.0_f32, 0.0])
}

pub fn vertical() -> Uniforms {
    Uniforms::new().with("uDirection", [0.0_f32, 1.0])
}
