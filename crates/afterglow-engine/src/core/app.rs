use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::{FrameCtx, ResizeCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called when the drawable size changes, including scale factor changes.
    ///
    /// The default reconfigures the surface. Apps that own size-dependent resources
    /// override this and resize them together with the surface.
    fn on_resize(&mut self, ctx: &mut ResizeCtx<'_, '_>) -> AppControl {
        ctx.gpu.resize(ctx.size);
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
