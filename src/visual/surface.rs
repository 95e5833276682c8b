//! Render surface lifecycle and the frame loop driving it.

use super::canvas::{PixelCanvas, Surface};
use super::engine::{FrameStats, ParticleEngine};
use super::intensity::IntensitySampler;
use crate::audio::AnalyserSource;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Something that can be asked to run another display frame.
pub trait FrameClock {
    fn request_frame(&self);
}

/// Handle to a scheduled frame; cancelling it keeps the frame from running.
#[derive(Clone, Debug)]
pub struct FrameTicket {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl FrameTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// The single perpetual "next frame" task.
#[derive(Default)]
pub struct FrameLoop {
    next_id: u64,
    pending: Option<FrameTicket>,
}

impl FrameLoop {
    /// Schedules the next frame, superseding any pending one.
    pub fn schedule_next(&mut self, clock: &dyn FrameClock) -> FrameTicket {
        self.cancel();
        self.next_id += 1;
        let ticket = FrameTicket {
            id: self.next_id,
            cancelled: Rc::new(Cell::new(false)),
        };
        self.pending = Some(ticket.clone());
        clock.request_frame();
        ticket
    }

    /// Consumes the pending frame if it is still live.
    pub fn take_due(&mut self) -> Option<FrameTicket> {
        self.pending.take().filter(|t| !t.is_cancelled())
    }

    pub fn cancel(&mut self) {
        if let Some(ticket) = self.pending.take() {
            ticket.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    Stopped,
    Running,
}

struct Diagnostics {
    since: Instant,
    frames: u32,
    intensity_sum: f32,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            since: Instant::now(),
            frames: 0,
            intensity_sum: 0.0,
        }
    }
}

/// Owns the canvas, the particle engine and the frame loop.
pub struct RenderSurface {
    state: SurfaceState,
    canvas: PixelCanvas,
    engine: ParticleEngine,
    frames: FrameLoop,
    sampler: IntensitySampler,
    regenerate_on_resize: bool,
    last_intensity: f32,
    diagnostics: Diagnostics,
}

impl RenderSurface {
    pub fn new(engine: ParticleEngine, regenerate_on_resize: bool) -> Self {
        Self {
            state: SurfaceState::Stopped,
            canvas: PixelCanvas::new(0, 0),
            engine,
            frames: FrameLoop::default(),
            sampler: IntensitySampler::default(),
            regenerate_on_resize,
            last_intensity: 0.0,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Sizes the canvas to the viewport, regenerates the field, and schedules the first frame.
    pub fn start(&mut self, viewport: (u32, u32), clock: &dyn FrameClock) {
        let (width, height) = viewport;
        self.canvas.resize(width, height);
        self.engine.regenerate(width, height);
        self.state = SurfaceState::Running;
        self.diagnostics = Diagnostics::default();
        self.frames.schedule_next(clock);

        log::info!(
            "Render surface started at {}x{} with {} particles",
            width,
            height,
            self.engine.field().len()
        );
    }

    /// Cancels the pending frame; no audio teardown happens here.
    pub fn stop(&mut self) {
        self.frames.cancel();
        if self.state == SurfaceState::Running {
            log::info!("Render surface stopped");
        }
        self.state = SurfaceState::Stopped;
    }

    /// Applies a viewport change. Particles keep their positions unless
    /// `regenerate_on_resize` is set. Returns whether anything changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.state != SurfaceState::Running || self.canvas.size() == (width, height) {
            return false;
        }

        self.canvas.resize(width, height);
        if self.regenerate_on_resize {
            self.engine.regenerate(width, height);
        } else {
            self.engine.set_bounds(width, height);
        }
        log::debug!("Canvas resized to {}x{}", width, height);
        true
    }

    /// Runs the due frame, if any, and schedules the next one.
    pub fn frame(
        &mut self,
        source: &dyn AnalyserSource,
        clock: &dyn FrameClock,
    ) -> Option<FrameStats> {
        if self.state != SurfaceState::Running {
            return None;
        }
        self.frames.take_due()?;

        let intensity = self.sampler.sample(source);
        let stats = self.engine.step(intensity, &mut self.canvas);
        self.last_intensity = intensity;
        self.report(intensity, stats);

        self.frames.schedule_next(clock);
        Some(stats)
    }

    fn report(&mut self, intensity: f32, stats: FrameStats) {
        let d = &mut self.diagnostics;
        d.frames += 1;
        d.intensity_sum += intensity;

        if d.since.elapsed() > Duration::from_secs(1) {
            log::debug!(
                "Render | Frames: {} | Particles: {} | Links: {} | Mean intensity: {:.3}",
                d.frames,
                stats.particles,
                stats.links,
                d.intensity_sum / d.frames as f32
            );
            *d = Diagnostics::default();
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    pub fn engine(&self) -> &ParticleEngine {
        &self.engine
    }

    pub fn last_intensity(&self) -> f32 {
        self.last_intensity
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frames.is_pending()
    }
}
