//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per frame to obtain `FrameTime`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
