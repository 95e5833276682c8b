use clap::Parser;
use particle_visualizer::audio::{capture, device::CpalPlatform, AudioGraph, PlayableElement};
use particle_visualizer::config::{Args, VisualizerConfig, ELEMENT_CAPACITY};
use particle_visualizer::gui::{self, VisualizerApp};
use particle_visualizer::player::{Playback, Transport};
use particle_visualizer::visual::{ParticleEngine, RenderSurface};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    //
    // Initialize logging with default filter set to "info".
    //
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = VisualizerConfig::from(Args::parse());
    config.validate()?;

    log::info!("Starting audio-reactive particle visualizer...");

    //
    // The audio graph is created empty; the context is built on first connect.
    //
    let platform = CpalPlatform::new(config.output_device.clone(), config.monitor_gain);
    let graph = Rc::new(AudioGraph::new(Box::new(platform), config.analyser));

    //
    // Input capture plays the role of the media element.
    //
    log::info!("Initializing audio capture...");
    let (element, sink) = PlayableElement::new("input", ELEMENT_CAPACITY);
    let playback: Option<Box<dyn Playback>> =
        match capture::open_input(config.input_device.as_deref(), sink) {
            Ok(stream) => Some(Box::new(stream) as Box<dyn Playback>),
            Err(err) => {
                log::error!("{}; continuing without audio", err);
                None
            }
        };
    let mut transport = Transport::new(element, playback);
    transport.set_volume(config.volume);

    let engine = ParticleEngine::new(StdRng::from_entropy(), config.density);
    let surface = RenderSurface::new(engine, config.regenerate_on_resize);

    //
    // Initialize GUI configuration.
    //
    log::info!("Initializing GUI...");
    let (width, height) = config.window_size;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32])
            .with_min_inner_size([320.0, 240.0])
            .with_title("particle-visualizer"),
        ..Default::default()
    };

    eframe::run_native(
        "particle-visualizer",
        options,
        Box::new(move |cc| {
            gui::theme::setup_global_style(&cc.egui_ctx);

            Ok(Box::new(VisualizerApp::new(cc, graph, transport, surface)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI terminated: {}", e))
}
