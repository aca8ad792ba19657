//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the application,
//! and the per-callback contexts handed to it.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, ResizeCtx, WindowCtx};
