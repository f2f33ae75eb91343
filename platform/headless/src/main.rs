use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tracereplay_engine::graphics::RenderContext;
use tracereplay_engine::{
    CameraPresets,
    LoadState,
    NoCameraPresets,
    Renderer,
    SceneLoader,
    SceneSource,
    TableCameraPresets,
    ViewerConfig,
};
use tracereplay_headless::{HeadlessBackend, HeadlessDevice, HeadlessDeviceInfo};

use crate::cli::Cli;

mod cli;

const PROGRESS_LOG_INTERVAL: u64 = 500;

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => match ViewerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ViewerConfig::default(),
    };
    cli.apply(&mut config);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ViewerConfig) -> Result<(), Box<dyn Error>> {
    let device = Arc::new(HeadlessDevice::new(HeadlessDeviceInfo {
        record_events: false,
        ..HeadlessDeviceInfo::default()
    })?);
    let swapchain = Arc::new(device.create_swapchain(config.width, config.height, config.backbuffer_count));
    let binding_table = Arc::new(device.create_binding_table());
    info!("Rendering {}x{} with {} backbuffers", config.width, config.height, config.backbuffer_count);

    let source = match &config.trace {
        Some(path) => SceneSource::TraceFile(path.clone()),
        None => SceneSource::BuiltinCube,
    };
    let presets: Box<dyn CameraPresets> = if config.camera_presets.is_empty() {
        Box::new(NoCameraPresets)
    } else {
        Box::new(TableCameraPresets::new(config.camera_presets.clone()))
    };
    let loader = SceneLoader::<HeadlessBackend>::spawn(&device, &binding_table, source, presets)?;
    let context = RenderContext::new(&device, &swapchain, &binding_table);
    let mut renderer = Renderer::new(context, loader, config.render);

    let mut frame = 0u64;
    while !renderer.load_state().is_finished() {
        frame = renderer.render().frame;
        if frame % PROGRESS_LOG_INTERVAL == 0 {
            let progress = renderer.loader().progress();
            info!(
                "Still loading after {} frames, {}/{} bottom level acceleration structures built",
                frame,
                progress.bottom_levels_built(),
                progress.bottom_levels_total()
            );
        }
    }
    info!("Load {} after {} frames", if renderer.load_state() == LoadState::Ready { "finished" } else { "failed" }, frame);

    for _ in 0..config.frames {
        renderer.render();
    }
    if let Some(fps) = renderer.frame_timer().fps() {
        info!("{:.1} fps", fps);
    }
    renderer.context().wait_for_idle();
    Ok(())
}
