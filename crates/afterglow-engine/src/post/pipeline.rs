//! Per-frame orchestration: animation, scene render, enabled stages, present.

use std::time::Duration;

use crate::camera::{CameraConfig, PerspectiveCamera};
use crate::time::FrameClock;

use super::backend::{Backend, GpuContext};
use super::error::{AddEffectError, FrameError, ResourceError};
use super::registry::EffectRegistry;
use super::resize::{Extent, RenderResources, ResizeCoordinator, ResizeOutcome};
use super::stage::StageDefinition;
use super::uniforms::{UniformValue, Uniforms};

/// Advances scene animation by wall-clock time.
pub trait AnimationDriver {
    fn advance(&mut self, delta_seconds: f32);
}

impl<F> AnimationDriver for F
where
    F: FnMut(f32),
{
    fn advance(&mut self, delta_seconds: f32) {
        self(delta_seconds)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub camera: CameraConfig,
    /// Upper clamp for the animation delta. `None` passes wall-clock time through.
    pub max_frame_delta: Option<Duration>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PipelineState {
    /// No frame has been requested yet.
    Uninitialized,
    Running,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    pub delta: Duration,
    pub frame_index: u64,
    /// Number of stages executed this frame.
    pub stages_run: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameOutcome {
    Rendered(FrameStats),
    /// Viewport is empty; nothing was recorded and the clock was not advanced.
    Skipped,
}

/// Scene render followed by an ordered chain of post-processing stages.
///
/// All control-surface calls take `&mut self`, so a frame always sees one consistent
/// snapshot of the registry.
pub struct RenderPipeline<B: Backend> {
    registry: EffectRegistry<B::Program>,
    resources: Option<RenderResources<B::Target>>,
    /// Last requested viewport; `None` until the first resize.
    viewport: Option<Extent>,
    camera: PerspectiveCamera,
    clock: FrameClock,
    animation: Option<Box<dyn AnimationDriver>>,
    state: PipelineState,
}

impl<B: Backend> RenderPipeline<B> {
    pub fn new(config: PipelineConfig) -> Self {
        let clock = match config.max_frame_delta {
            Some(max) => FrameClock::with_max_delta(max),
            None => FrameClock::new(),
        };
        Self {
            registry: EffectRegistry::new(),
            resources: None,
            viewport: None,
            camera: PerspectiveCamera::new(config.camera),
            clock,
            animation: None,
            state: PipelineState::Uninitialized,
        }
    }

    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[inline]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Position and orientation only; the aspect ratio follows the viewport.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    #[inline]
    pub fn registry(&self) -> &EffectRegistry<B::Program> {
        &self.registry
    }

    /// Current target extent, if targets are allocated.
    pub fn target_extent(&self) -> Option<Extent> {
        self.resources.as_ref().map(RenderResources::extent)
    }

    /// Installs the animation driver, returning the previous one.
    pub fn set_animation_driver(&mut self, driver: impl AnimationDriver + 'static) -> Option<Box<dyn AnimationDriver>> {
        self.animation.replace(Box::new(driver))
    }

    pub fn take_animation_driver(&mut self) -> Option<Box<dyn AnimationDriver>> {
        self.animation.take()
    }

    // ── control surface ───────────────────────────────────────────────────

    pub fn add_effect<G: GpuContext<B>>(
        &mut self,
        gpu: &mut G,
        name: &str,
        def: &StageDefinition,
        overrides: Option<&Uniforms>,
    ) -> Result<(), AddEffectError> {
        self.registry.add::<B, G>(gpu, name, def, overrides)
    }

    /// No-op for unknown names.
    pub fn set_effect_enabled(&mut self, name: &str, enabled: bool) {
        self.registry.set_enabled(name, enabled);
    }

    /// No-op for unknown names, undeclared parameters and kind mismatches.
    pub fn set_effect_parameter(&mut self, name: &str, param: &str, value: impl Into<UniformValue>) {
        self.registry.set_parameter(name, param, value.into());
    }

    /// Drops an effect and its stage. Returns whether it was registered.
    pub fn remove_effect(&mut self, name: &str) -> bool {
        self.registry.remove(name).is_some()
    }

    /// Sizes the surface, the camera and every pipeline-owned target to `width`×`height`.
    ///
    /// A zero-sized viewport suspends rendering until the next non-empty resize.
    pub fn on_viewport_resize<G: GpuContext<B>>(
        &mut self,
        gpu: &mut G,
        width: u32,
        height: u32,
    ) -> Result<ResizeOutcome, ResourceError> {
        let extent = Extent::new(width, height);
        self.viewport = Some(extent);
        ResizeCoordinator::apply::<B, G>(gpu, &mut self.camera, &mut self.resources, extent)
    }

    // ── frame cycle ───────────────────────────────────────────────────────

    /// Runs one frame.
    ///
    /// `scene` renders into the scene target with the pipeline's camera. Enabled stages
    /// then run in registration order, each reading the previous enabled stage's output
    /// (the scene for the first), and the last output is presented.
    pub fn render_frame<G, F>(&mut self, gpu: &mut G, frame: &mut B::Frame, scene: F) -> Result<FrameOutcome, FrameError>
    where
        G: GpuContext<B>,
        F: FnOnce(&mut G, &mut B::Frame, &B::Target, &PerspectiveCamera),
    {
        if self.state == PipelineState::Uninitialized {
            if self.viewport.is_none() {
                let initial = gpu.surface_extent();
                self.on_viewport_resize(gpu, initial.width, initial.height)?;
            }
            self.state = PipelineState::Running;
            log::info!("pipeline running with {} effect(s)", self.registry.len());
        }

        let viewport = self.viewport.unwrap_or_default();
        if viewport.is_empty() {
            self.clock.reset();
            return Ok(FrameOutcome::Skipped);
        }

        if self.resources.is_none() {
            // A previous allocation failed; try again before giving up on the frame.
            ResizeCoordinator::apply::<B, G>(gpu, &mut self.camera, &mut self.resources, viewport)?;
        }
        let Some(resources) = self.resources.as_ref() else {
            return Ok(FrameOutcome::Skipped);
        };
        resources.verify::<B>(viewport)?;

        let time = self.clock.tick();
        if let Some(driver) = self.animation.as_mut() {
            driver.advance(time.dt);
        }

        scene(gpu, frame, resources.scene(), &self.camera);

        let mut input = resources.scene();
        let mut stages_run = 0;
        for entry in self.registry.entries_mut() {
            if !entry.is_enabled() {
                continue;
            }
            let stage = entry.stage_mut();
            if stage.take_dirty() {
                gpu.write_uniforms(stage.program(), &stage.uniforms().to_bytes());
            }
            let output = resources.stage_output(stages_run);
            gpu.run_stage(frame, stage.program(), input, output);
            input = output;
            stages_run += 1;
        }

        gpu.present(frame, input);

        Ok(FrameOutcome::Rendered(FrameStats {
            delta: time.delta,
            frame_index: time.frame_index,
            stages_run,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::post::builtin;
    use crate::post::testing::{MockFrame, MockTarget, Recording, RecordingGpu};

    type Pipeline = RenderPipeline<Recording>;

    fn setup() -> (RecordingGpu, Pipeline) {
        (RecordingGpu::new(Extent::new(640, 480)), Pipeline::new(PipelineConfig::default()))
    }

    fn scene(_: &mut RecordingGpu, frame: &mut MockFrame, target: &MockTarget, _: &PerspectiveCamera) {
        frame.record_scene(target);
    }

    fn run_frame(gpu: &mut RecordingGpu, pipeline: &mut Pipeline) -> MockFrame {
        let mut frame = MockFrame::default();
        pipeline.render_frame(gpu, &mut frame, scene).unwrap();
        frame
    }

    fn add_plain(gpu: &mut RecordingGpu, pipeline: &mut Pipeline, names: &[&str]) {
        for name in names {
            pipeline.add_effect(gpu, name, &builtin::bloom(), None).unwrap();
        }
    }

    /// bloom (threshold 0.2), blurH and blurV (amount 1.8).
    fn standard_chain(gpu: &mut RecordingGpu, pipeline: &mut Pipeline) {
        let blur_h = builtin::horizontal().with("uBlurAmount", 1.8_f32);
        let blur_v = builtin::vertical().with("uBlurAmount", 1.8_f32);

        pipeline
            .add_effect(gpu, "bloom", &builtin::bloom(), Some(&Uniforms::new().with("uBrightnessThreshold", 0.2_f32)))
            .unwrap();
        pipeline.add_effect(gpu, "blurH", &builtin::directional_blur(), Some(&blur_h)).unwrap();
        pipeline.add_effect(gpu, "blurV", &builtin::directional_blur(), Some(&blur_v)).unwrap();
    }

    // ── ordering and skip semantics ───────────────────────────────────────

    #[test]
    fn stages_run_in_registration_order_for_any_enabled_subset() {
        let (mut gpu, mut pipeline) = setup();
        add_plain(&mut gpu, &mut pipeline, &["a", "b", "c"]);

        let subsets: [(&[&str], &[&str]); 5] = [
            (&[], &["a", "b", "c"]),
            (&["b"], &["a", "c"]),
            (&["a", "c"], &["b"]),
            (&["a"], &["b", "c"]),
            (&["a", "b", "c"], &[]),
        ];

        for (disabled, expected) in subsets {
            for name in ["a", "b", "c"] {
                pipeline.set_effect_enabled(name, !disabled.contains(&name));
            }
            let frame = run_frame(&mut gpu, &mut pipeline);
            assert_eq!(frame.executed(), expected, "disabled: {disabled:?}");
        }
    }

    #[test]
    fn disabled_stage_is_absent_from_the_input_chain() {
        let (mut gpu, mut pipeline) = setup();
        add_plain(&mut gpu, &mut pipeline, &["a", "b", "c"]);

        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.inputs(), [("a", "scene"), ("b", "a"), ("c", "b")]);

        pipeline.set_effect_enabled("b", false);
        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.inputs(), [("a", "scene"), ("c", "a")]);

        pipeline.set_effect_enabled("b", true);
        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.inputs(), [("a", "scene"), ("b", "a"), ("c", "b")]);
    }

    #[test]
    fn no_enabled_stages_presents_the_scene() {
        let (mut gpu, mut pipeline) = setup();
        add_plain(&mut gpu, &mut pipeline, &["a"]);
        pipeline.set_effect_enabled("a", false);

        let frame = run_frame(&mut gpu, &mut pipeline);
        assert!(frame.executed().is_empty());
        assert_eq!(frame.presented(), Some("scene"));
    }

    #[test]
    fn empty_registry_presents_the_scene() {
        let (mut gpu, mut pipeline) = setup();
        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.presented(), Some("scene"));
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn bloom_blur_chain_with_live_threshold_change() {
        let (mut gpu, mut pipeline) = setup();
        standard_chain(&mut gpu, &mut pipeline);

        pipeline.set_effect_parameter("bloom", "uBrightnessThreshold", 0.6_f32);
        let frame = run_frame(&mut gpu, &mut pipeline);

        let bloom = pipeline.registry().get("bloom").unwrap();
        assert_eq!(bloom.parameters().get("uBrightnessThreshold"), Some(UniformValue::Scalar(0.6)));
        assert_eq!(frame.executed(), ["bloom", "blurH", "blurV"]);
        assert_eq!(frame.presented(), Some("blurV"));
    }

    #[test]
    fn disabling_last_blur_presents_first_blur() {
        let (mut gpu, mut pipeline) = setup();
        standard_chain(&mut gpu, &mut pipeline);
        run_frame(&mut gpu, &mut pipeline);

        pipeline.set_effect_enabled("blurV", false);
        let frame = run_frame(&mut gpu, &mut pipeline);

        assert_eq!(frame.executed(), ["bloom", "blurH"]);
        assert_eq!(frame.presented(), Some("blurH"));
    }

    #[test]
    fn failed_effect_is_absent_and_the_chain_still_runs() {
        let (mut gpu, mut pipeline) = setup();
        gpu.reject.push("blurH".into());

        pipeline.add_effect(&mut gpu, "bloom", &builtin::bloom(), None).unwrap();
        let err = pipeline
            .add_effect(&mut gpu, "blurH", &builtin::directional_blur(), Some(&builtin::horizontal()))
            .unwrap_err();
        assert!(matches!(err, AddEffectError::Compile(_)));
        pipeline.add_effect(&mut gpu, "blurV", &builtin::directional_blur(), Some(&builtin::vertical())).unwrap();

        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.executed(), ["bloom", "blurV"]);
        assert_eq!(frame.inputs(), [("bloom", "scene"), ("blurV", "bloom")]);
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn uniforms_upload_on_first_run_and_after_changes_only() {
        let (mut gpu, mut pipeline) = setup();
        standard_chain(&mut gpu, &mut pipeline);

        run_frame(&mut gpu, &mut pipeline);
        let first: Vec<&str> = gpu.uploads.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(first, ["bloom", "blurH", "blurV"]);

        gpu.uploads.clear();
        run_frame(&mut gpu, &mut pipeline);
        assert!(gpu.uploads.is_empty());

        pipeline.set_effect_parameter("blurH", "uBlurAmount", 4.0_f32);
        run_frame(&mut gpu, &mut pipeline);
        assert_eq!(gpu.uploads.len(), 1);
        assert_eq!(gpu.uploads[0].0, "blurH");
        assert_eq!(gpu.uploads[0].1, pipeline.registry().get("blurH").unwrap().stage().uniforms().to_bytes());
    }

    #[test]
    fn disabled_stage_uploads_when_reenabled() {
        let (mut gpu, mut pipeline) = setup();
        standard_chain(&mut gpu, &mut pipeline);
        run_frame(&mut gpu, &mut pipeline);
        gpu.uploads.clear();

        pipeline.set_effect_enabled("bloom", false);
        pipeline.set_effect_parameter("bloom", "uIntensity", 2.0_f32);
        run_frame(&mut gpu, &mut pipeline);
        assert!(gpu.uploads.is_empty());

        pipeline.set_effect_enabled("bloom", true);
        run_frame(&mut gpu, &mut pipeline);
        assert_eq!(gpu.uploads.len(), 1);
    }

    // ── sizing ────────────────────────────────────────────────────────────

    #[test]
    fn first_frame_sizes_from_the_surface() {
        let (mut gpu, mut pipeline) = setup();
        assert_eq!(pipeline.state(), PipelineState::Uninitialized);

        run_frame(&mut gpu, &mut pipeline);

        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(pipeline.target_extent(), Some(Extent::new(640, 480)));
        assert_eq!(pipeline.camera().aspect(), 640.0 / 480.0);
    }

    #[test]
    fn resize_before_first_frame_is_kept() {
        let (mut gpu, mut pipeline) = setup();
        pipeline.on_viewport_resize(&mut gpu, 800, 600).unwrap();
        let allocations = gpu.allocations.len();

        run_frame(&mut gpu, &mut pipeline);
        assert_eq!(pipeline.target_extent(), Some(Extent::new(800, 600)));
        assert_eq!(gpu.allocations.len(), allocations);
    }

    #[test]
    fn repeated_resize_matches_single_resize() {
        let (mut gpu_once, mut once) = setup();
        once.on_viewport_resize(&mut gpu_once, 800, 600).unwrap();

        let (mut gpu_twice, mut twice) = setup();
        twice.on_viewport_resize(&mut gpu_twice, 800, 600).unwrap();
        let second = twice.on_viewport_resize(&mut gpu_twice, 800, 600).unwrap();

        assert_eq!(second, ResizeOutcome::Unchanged);
        assert_eq!(twice.target_extent(), once.target_extent());
        assert_eq!(twice.camera().projection(), once.camera().projection());
        assert_eq!(gpu_twice.allocations, gpu_once.allocations);
        assert_eq!(gpu_twice.surface, gpu_once.surface);
        assert_eq!(gpu_twice.reconfigures, gpu_once.reconfigures);
    }

    #[test]
    fn zero_viewport_skips_frames_until_restored() {
        let (mut gpu, mut pipeline) = setup();
        let advanced = Rc::new(Cell::new(0u32));
        let counter = advanced.clone();
        pipeline.set_animation_driver(move |_dt: f32| counter.set(counter.get() + 1));

        run_frame(&mut gpu, &mut pipeline);
        pipeline.on_viewport_resize(&mut gpu, 0, 0).unwrap();

        let mut frame = MockFrame::default();
        let outcome = pipeline.render_frame(&mut gpu, &mut frame, scene).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert!(frame.ops.is_empty());
        assert_eq!(advanced.get(), 1);

        pipeline.on_viewport_resize(&mut gpu, 320, 200).unwrap();
        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.presented(), Some("scene"));
        assert_eq!(advanced.get(), 2);
    }

    #[test]
    fn restoring_the_same_extent_after_minimize_restores_the_surface() {
        let (mut gpu, mut pipeline) = setup();
        run_frame(&mut gpu, &mut pipeline);
        let allocations = gpu.allocations.len();

        pipeline.on_viewport_resize(&mut gpu, 0, 0).unwrap();
        assert_eq!(gpu.surface_extent(), Extent::new(0, 0));
        let mut frame = MockFrame::default();
        assert_eq!(pipeline.render_frame(&mut gpu, &mut frame, scene).unwrap(), FrameOutcome::Skipped);

        let outcome = pipeline.on_viewport_resize(&mut gpu, 640, 480).unwrap();
        assert_eq!(outcome, ResizeOutcome::Resized);
        assert_eq!(gpu.surface_extent(), Extent::new(640, 480));
        assert_eq!(gpu.allocations.len(), allocations);

        let frame = run_frame(&mut gpu, &mut pipeline);
        assert_eq!(frame.presented(), Some("scene"));
    }

    #[test]
    fn failed_allocation_fails_frames_instead_of_rendering_mismatched() {
        let (mut gpu, mut pipeline) = setup();
        run_frame(&mut gpu, &mut pipeline);

        gpu.max_dimension = 1024;
        assert!(pipeline.on_viewport_resize(&mut gpu, 2048, 600).is_err());

        let mut frame = MockFrame::default();
        let err = pipeline.render_frame(&mut gpu, &mut frame, scene).unwrap_err();
        assert!(matches!(err, FrameError::ExtentMismatch { .. }));
        assert!(frame.ops.is_empty());
    }

    // ── animation ─────────────────────────────────────────────────────────

    #[test]
    fn animation_driver_can_arrive_late_and_be_swapped() {
        let (mut gpu, mut pipeline) = setup();
        run_frame(&mut gpu, &mut pipeline);

        let log = Rc::new(RefCell::new(Vec::new()));
        let first = log.clone();
        assert!(pipeline.set_animation_driver(move |dt: f32| first.borrow_mut().push(("first", dt))).is_none());
        run_frame(&mut gpu, &mut pipeline);

        let second = log.clone();
        assert!(pipeline.set_animation_driver(move |dt: f32| second.borrow_mut().push(("second", dt))).is_some());
        run_frame(&mut gpu, &mut pipeline);

        let calls = log.borrow();
        let names: Vec<&str> = calls.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(calls.iter().all(|(_, dt)| *dt >= 0.0));
    }

    #[test]
    fn frame_stats_count_executed_stages() {
        let (mut gpu, mut pipeline) = setup();
        standard_chain(&mut gpu, &mut pipeline);
        pipeline.set_effect_enabled("blurH", false);

        let mut frame = MockFrame::default();
        let FrameOutcome::Rendered(stats) = pipeline.render_frame(&mut gpu, &mut frame, scene).unwrap() else {
            panic!("frame skipped");
        };
        assert_eq!(stats.stages_run, 2);
        assert_eq!(stats.frame_index, 0);
    }
}
