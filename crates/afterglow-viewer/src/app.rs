use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::WindowId;

use afterglow_engine::core::{App, AppControl, FrameCtx, ResizeCtx};
use afterglow_engine::device::{Gpu, Wgpu};
use afterglow_engine::post::{builtin, FrameOutcome, PipelineConfig, RenderPipeline};

use crate::controls::{ControlCommand, ControlPanel, PanelAction};
use crate::scene::{NeonScene, SceneConfig};

/// Frames between periodic stats lines at debug level.
const STATS_INTERVAL: u64 = 600;

/// Demo host: neon scene, bloom and two blur passes, keyboard control panel.
///
/// The scene and the effects need a device, so they are created on the first frame.
pub struct ViewerApp {
    pipeline: RenderPipeline<Wgpu>,
    scene: Option<NeonScene>,
    scene_config: SceneConfig,
    panel: ControlPanel,
    modifiers: ModifiersState,
    driver_attached: bool,
}

impl ViewerApp {
    pub fn new(config: PipelineConfig, scene_config: SceneConfig) -> Self {
        Self {
            pipeline: RenderPipeline::new(config),
            scene: None,
            scene_config,
            panel: ControlPanel::new(),
            modifiers: ModifiersState::empty(),
            driver_attached: false,
        }
    }

    fn apply(&mut self, commands: Vec<ControlCommand>) {
        for command in commands {
            match command {
                ControlCommand::SetParameter { effect, param, value } => {
                    self.pipeline.set_effect_parameter(effect, param, value)
                }
                ControlCommand::SetEnabled { effect, enabled } => {
                    self.pipeline.set_effect_enabled(effect, enabled)
                }
            }
        }
    }

    fn on_key(&mut self, code: KeyCode, repeat: bool) -> AppControl {
        if code == KeyCode::Escape {
            return AppControl::Exit;
        }

        let Some(action) = PanelAction::from_key(code, self.modifiers.shift_key()) else {
            return AppControl::Continue;
        };
        // Only the value keys auto-repeat.
        if repeat && !matches!(action, PanelAction::Increase | PanelAction::Decrease) {
            return AppControl::Continue;
        }

        let commands = self.panel.handle(action);
        log::info!("{}", self.panel.describe_selected());
        self.apply(commands);
        AppControl::Continue
    }
}

/// Registers the built-in chain: bloom, then horizontal and vertical blur.
///
/// A stage that fails to compile is reported and left out; the rest still run.
fn register_effects(pipeline: &mut RenderPipeline<Wgpu>, gpu: &mut Gpu<'_>) {
    let effects = [
        ("bloom", builtin::bloom(), None),
        ("blurH", builtin::directional_blur(), Some(builtin::horizontal())),
        ("blurV", builtin::directional_blur(), Some(builtin::vertical())),
    ];

    for (name, def, overrides) in effects {
        if let Err(e) = pipeline.add_effect(gpu, name, &def, overrides.as_ref()) {
            log::error!("{e}");
        }
    }
}

impl App for ViewerApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = m.state();
                AppControl::Continue
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.on_key(code, event.repeat),
                    PhysicalKey::Unidentified(_) => AppControl::Continue,
                }
            }
            _ => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, ctx: &mut ResizeCtx<'_, '_>) -> AppControl {
        match self
            .pipeline
            .on_viewport_resize(ctx.gpu, ctx.size.width, ctx.size.height)
        {
            Ok(_) => AppControl::Continue,
            Err(e) => {
                log::error!("viewport resize failed: {e}");
                AppControl::Exit
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Self {
            pipeline,
            scene,
            scene_config,
            driver_attached,
            ..
        } = self;

        ctx.frame(|gpu, frame| {
            let scene = scene.get_or_insert_with(|| {
                register_effects(pipeline, gpu);
                NeonScene::new(gpu, scene_config.clone())
            });

            let outcome = pipeline.render_frame(gpu, frame, |gpu, frame, target, camera| {
                scene.render(gpu, frame, target, camera)
            });

            match outcome {
                Ok(FrameOutcome::Rendered(stats)) => {
                    // The scene's buffers are on the GPU once its first frame is submitted.
                    if !*driver_attached {
                        pipeline.set_animation_driver(scene.spin_driver());
                        *driver_attached = true;
                        log::info!("animation driver attached");
                    }
                    if stats.frame_index % STATS_INTERVAL == 0 {
                        log::debug!(
                            "frame {}: {:.2} ms, {} stage(s)",
                            stats.frame_index,
                            stats.delta.as_secs_f64() * 1000.0,
                            stats.stages_run
                        );
                    }
                    AppControl::Continue
                }
                Ok(FrameOutcome::Skipped) => AppControl::Continue,
                Err(e) => {
                    log::error!("frame failed: {e}");
                    AppControl::Exit
                }
            }
        })
    }
}
