//! Afterglow engine crate.
//!
//! Platform + GPU runtime and the post-processing effect pipeline: a scene renders
//! into an offscreen target, then an ordered chain of named stages runs before the
//! result is presented.

pub mod camera;
pub mod core;
pub mod device;
pub mod logging;
pub mod post;
pub mod time;
pub mod window;
