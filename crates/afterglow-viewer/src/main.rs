mod app;
mod controls;
mod scene;

use std::time::Duration;

use afterglow_engine::device::GpuInit;
use afterglow_engine::logging::{init_logging, LoggingConfig};
use afterglow_engine::post::PipelineConfig;
use afterglow_engine::window::{Runtime, RuntimeConfig};

use app::ViewerApp;
use scene::SceneConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    log::info!("Tab/Shift+Tab select a control, Left/Right adjust, Space toggles, R resets, Esc quits");

    let pipeline = PipelineConfig {
        // Keeps the spin from jumping after a stall (window drag, debugger break).
        max_frame_delta: Some(Duration::from_millis(100)),
        ..Default::default()
    };

    Runtime::run(
        RuntimeConfig::default(),
        GpuInit::default(),
        ViewerApp::new(pipeline, SceneConfig::default()),
    )
}
