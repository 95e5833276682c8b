pub mod canvas;
pub mod engine;
pub mod intensity;
pub mod particle;
pub mod surface;

pub use canvas::{Hsla, PixelCanvas, Surface};
pub use engine::{link_opacity, link_threshold, FrameStats, ParticleEngine};
pub use intensity::{audio_intensity, IntensitySampler};
pub use particle::{particle_count, Particle, ParticleField, DENSITY};
pub use surface::{FrameClock, FrameLoop, FrameTicket, RenderSurface, SurfaceState};
