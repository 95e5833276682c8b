use approx::assert_relative_eq;
use eframe::egui::Pos2;
use particle_visualizer::audio::{
    AnalyserInput, AnalyserOptions, AnalyserSource, AudioGraph, AudioPlatform, ContextState,
    GraphError, PlayableElement, ProcessingContext, SourceNode, VisualizerControl,
};
use particle_visualizer::visual::{
    audio_intensity, FrameClock, Hsla, ParticleEngine, RenderSurface, Surface, SurfaceState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::rc::Rc;

type Route = Rc<RefCell<Option<(SourceNode, AnalyserInput)>>>;

#[derive(Default)]
struct Platform {
    route: Route,
    contexts: Cell<usize>,
    fail_detach: Cell<bool>,
}

struct Context {
    route: Route,
    state: ContextState,
    fail_detach: bool,
}

impl ProcessingContext for Context {
    fn state(&self) -> ContextState {
        self.state
    }
    fn resume(&mut self) {
        self.state = ContextState::Running;
    }
    fn sample_rate(&self) -> u32 {
        44_100
    }
    fn connect_source(&mut self, source: SourceNode, tap: AnalyserInput) -> Result<(), GraphError> {
        *self.route.borrow_mut() = Some((source, tap));
        Ok(())
    }
    fn disconnect_source(&mut self) -> Result<(), GraphError> {
        self.route.borrow_mut().take();
        if self.fail_detach {
            Err(GraphError::Detach("platform threw".into()))
        } else {
            Ok(())
        }
    }
}

struct SharedPlatform(Rc<Platform>);

impl AudioPlatform for SharedPlatform {
    fn create_context(&self) -> Result<Box<dyn ProcessingContext>, GraphError> {
        let platform = &self.0;
        platform.contexts.set(platform.contexts.get() + 1);
        Ok(Box::new(Context {
            route: Rc::clone(&platform.route),
            state: ContextState::Suspended,
            fail_detach: platform.fail_detach.get(),
        }))
    }
}

/// Moves one analysis window from the connected source into the analyser,
/// the way the output callback does.
fn pump(route: &Route) {
    if let Some((source, tap)) = route.borrow_mut().as_mut() {
        let mut block = vec![0.0; 512];
        source.pull(&mut block);
        tap.write(&block);
    }
}

fn setup() -> (Rc<Platform>, AudioGraph) {
    let platform = Rc::new(Platform::default());
    let graph = AudioGraph::new(
        Box::new(SharedPlatform(Rc::clone(&platform))),
        AnalyserOptions::default(),
    );
    (platform, graph)
}

#[derive(Default)]
struct Clock(Cell<usize>);

impl FrameClock for Clock {
    fn request_frame(&self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Default)]
struct Recording {
    size: (u32, u32),
    fills: Vec<f32>,
    glows: Vec<(Pos2, f32, Hsla)>,
    lines: Vec<(Pos2, Pos2, f32, Hsla)>,
}

impl Surface for Recording {
    fn size(&self) -> (u32, u32) {
        self.size
    }
    fn fill(&mut self, _rgb: [f32; 3], alpha: f32) {
        self.fills.push(alpha);
    }
    fn radial_glow(&mut self, center: Pos2, radius: f32, inner: Hsla, _outer: Hsla) {
        self.glows.push((center, radius, inner));
    }
    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Hsla) {
        self.lines.push((from, to, width, color));
    }
}

fn bass_tone(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.9 * (2.0 * PI * 6.0 * i as f32 / 512.0).sin())
        .collect()
}

fn surface_with(seed: u64, regenerate_on_resize: bool) -> RenderSurface {
    let engine = ParticleEngine::new(StdRng::seed_from_u64(seed), 12_000);
    RenderSurface::new(engine, regenerate_on_resize)
}

#[test]
fn bass_band_alone_gives_half_intensity() {
    let mut snapshot = vec![0u8; 256];
    snapshot[..50].fill(255);
    assert_relative_eq!(audio_intensity(Some(&snapshot), true), 0.5);
}

#[test]
fn inactive_flag_silences_full_spectrum() {
    assert_eq!(audio_intensity(Some(&[255u8; 256]), false), 0.0);
}

#[test]
fn repeated_connect_never_rewraps() {
    let (platform, graph) = setup();
    let (element, _sink) = PlayableElement::new("radio", 1024);

    assert!(graph.connect_element(&element));
    assert!(graph.connect_element(&element));
    assert!(graph.is_active());
    assert_eq!(platform.contexts.get(), 1);
    assert_eq!(graph.context_state(), Some(ContextState::Running));

    // A different element cannot claim a second source either.
    let (other, _other_sink) = PlayableElement::new("other", 1024);
    assert!(graph.connect_element(&other));
    assert!(!other.is_bound());
}

#[test]
fn disconnect_forces_inactive_even_when_detach_throws() {
    let (platform, graph) = setup();
    platform.fail_detach.set(true);
    let (element, _sink) = PlayableElement::new("radio", 1024);

    graph.connect_element(&element);
    VisualizerControl::disconnect(&graph);
    assert!(!graph.is_active());

    // Reconnecting only resumes; the flag is never revived automatically.
    assert!(graph.connect_element(&element));
    assert!(!graph.is_active());
}

#[test]
fn canvas_area_sets_particle_count() {
    let mut surface = surface_with(1, false);
    let clock = Clock::default();
    surface.start((1200, 800), &clock);

    assert_eq!(surface.state(), SurfaceState::Running);
    assert_eq!(surface.engine().field().len(), 80);
    assert_eq!(clock.0.get(), 1);
}

#[test]
fn link_between_two_particles_at_half_threshold() {
    let mut engine = ParticleEngine::new(StdRng::seed_from_u64(2), 12_000);
    engine.regenerate(200, 120);
    assert_eq!(engine.field().len(), 2);

    let particles = engine.field_mut().particles_mut();
    particles[0].pos = Pos2::new(50.0, 60.0);
    particles[1].pos = Pos2::new(125.0, 60.0);

    let mut surface = Recording {
        size: (200, 120),
        ..Default::default()
    };
    let stats = engine.step(0.0, &mut surface);

    assert_eq!(stats.links, 1);
    assert_eq!(surface.fills, vec![0.15]);
    assert_eq!(surface.glows.len(), 2);

    let (_, _, width, color) = surface.lines[0];
    assert_eq!(width, 1.0);
    assert_eq!(color.h, 270.0);
    // Each particle drifts at most 0.25px per axis before linking.
    assert_relative_eq!(color.a, 0.15, epsilon = 2e-3);
}

#[test]
fn positions_stay_wrapped_under_full_intensity() {
    let mut engine = ParticleEngine::new(StdRng::seed_from_u64(3), 1_000);
    engine.regenerate(90, 70);
    for p in engine.field_mut().particles_mut() {
        p.pos = Pos2::new(89.99, 0.0);
    }

    let mut surface = Recording::default();
    for _ in 0..200 {
        engine.step(1.0, &mut surface);
        for p in engine.field().particles() {
            assert!((0.0..90.0).contains(&p.pos.x), "x = {}", p.pos.x);
            assert!((0.0..70.0).contains(&p.pos.y), "y = {}", p.pos.y);
        }
    }
}

#[test]
fn connected_audio_drives_the_render_loop() {
    let (platform, graph) = setup();
    let (element, mut sink) = PlayableElement::new("radio", 8192);
    let clock = Clock::default();

    let mut surface = surface_with(4, false);
    surface.start((240, 200), &clock);

    // Nothing connected yet: idle motion.
    assert!(surface.frame(&graph, &clock).is_some());
    assert_eq!(surface.last_intensity(), 0.0);

    assert!(graph.connect_element(&element));
    sink.push_slice(&bass_tone(2048));
    pump(&platform.route);

    surface.frame(&graph, &clock);
    assert!(surface.last_intensity() > 0.01, "intensity {}", surface.last_intensity());
    assert!(surface.last_intensity() <= 1.0);

    graph.disconnect();
    surface.frame(&graph, &clock);
    assert_eq!(surface.last_intensity(), 0.0);
    assert!(platform.route.borrow().is_none());
}

#[test]
fn analyser_handle_is_only_exposed_after_connect() {
    let (_, graph) = setup();
    assert!(AnalyserSource::analyser_handle(&graph).is_none());

    let (element, _sink) = PlayableElement::new("radio", 64);
    graph.connect_element(&element);
    let handle = graph.analyser_handle().expect("analyser after connect");

    let mut snapshot = vec![0u8; 256];
    assert!(handle.sample(&mut snapshot));
    assert!(snapshot.iter().all(|&b| b == 0));
}

#[test]
fn stop_cancels_the_pending_frame() {
    let (_, graph) = setup();
    let clock = Clock::default();
    let mut surface = surface_with(5, false);

    surface.start((300, 300), &clock);
    assert!(surface.has_pending_frame());

    surface.stop();
    assert!(!surface.has_pending_frame());
    assert!(surface.frame(&graph, &clock).is_none());
    assert_eq!(clock.0.get(), 1);

    // Resize events are no longer observed once stopped.
    assert!(!surface.resize(600, 600));
}

#[test]
fn resize_keeps_particles_unless_configured() {
    let clock = Clock::default();

    let mut surface = surface_with(6, false);
    surface.start((1200, 800), &clock);
    assert!(surface.resize(600, 400));
    assert_eq!(surface.engine().field().len(), 80);
    assert_eq!(surface.canvas().size(), (600, 400));

    let mut surface = surface_with(6, true);
    surface.start((1200, 800), &clock);
    assert!(surface.resize(600, 400));
    assert_eq!(surface.engine().field().len(), 20);
}

#[test]
fn each_frame_schedules_exactly_one_successor() {
    let (_, graph) = setup();
    let clock = Clock::default();
    let mut surface = surface_with(7, false);
    surface.start((400, 300), &clock);

    for _ in 0..5 {
        assert!(surface.frame(&graph, &clock).is_some());
        assert!(surface.has_pending_frame());
    }
    assert_eq!(clock.0.get(), 6);
}
