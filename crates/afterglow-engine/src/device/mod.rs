//! GPU device, surface and the wgpu implementation of the post-processing backend.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - allocating offscreen targets and running post-processing stages

mod error;
mod frame;
mod gpu;
mod init;
mod post;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use post::{OffscreenTarget, StageProgram, Wgpu, DEPTH_FORMAT};
