/// What the frame loop does after the surface refused to hand out an image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; the next frame can acquire normally.
    Reconfigured,
    /// Drop this frame and try again on the next redraw.
    SkipFrame,
    /// Unrecoverable (out of memory); the runtime should shut down.
    Fatal,
}
