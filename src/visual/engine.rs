//! Per-frame particle physics and painting.

use super::canvas::{Hsla, Surface};
use super::particle::ParticleField;
use rand::RngCore;

pub const BASE_FADE: f32 = 0.15;
pub const FADE_RANGE: f32 = 0.1;

pub const LINK_DISTANCE: f32 = 150.0;
pub const LINK_DISTANCE_GAIN: f32 = 100.0;
pub const LINK_HUE: f32 = 270.0;

/// Alpha of the black veil painted over the previous frame.
pub fn fade_alpha(intensity: f32) -> f32 {
    BASE_FADE - intensity * FADE_RANGE
}

pub fn link_threshold(intensity: f32) -> f32 {
    LINK_DISTANCE + intensity * LINK_DISTANCE_GAIN
}

/// Opacity of a connection line, decaying linearly to 0 at `threshold`.
pub fn link_opacity(distance: f32, threshold: f32, intensity: f32) -> f32 {
    if distance >= threshold {
        return 0.0;
    }
    (1.0 - distance / threshold) * (0.3 + intensity * 0.7)
}

pub fn link_hue(intensity: f32) -> f32 {
    LINK_HUE + intensity * 30.0
}

pub fn link_width(intensity: f32) -> f32 {
    1.0 + intensity * 2.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
}

pub struct ParticleEngine {
    field: ParticleField,
    rng: Box<dyn RngCore>,
    density: u32,
}

impl ParticleEngine {
    pub fn new(rng: impl RngCore + 'static, density: u32) -> Self {
        Self {
            field: ParticleField::default(),
            rng: Box::new(rng),
            density,
        }
    }

    /// Discards the field and spawns a new one for the given canvas size.
    pub fn regenerate(&mut self, width: u32, height: u32) {
        self.field = ParticleField::generate(&mut self.rng, width, height, self.density);
        log::debug!(
            "Spawned {} particles for {}x{}",
            self.field.len(),
            width,
            height
        );
    }

    pub fn set_bounds(&mut self, width: u32, height: u32) {
        self.field.set_bounds(width, height);
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    /// Fades the previous frame, advances and paints every particle, then
    /// draws the proximity links.
    pub fn step(&mut self, intensity: f32, surface: &mut dyn Surface) -> FrameStats {
        surface.fill([0.0; 3], fade_alpha(intensity));

        let (width, height) = self.field.bounds();
        for p in self.field.particles_mut() {
            p.update(&mut self.rng, intensity, width, height);
            surface.radial_glow(
                p.pos,
                p.glow_radius(),
                Hsla::new(p.hue, 1.0, 0.7, p.opacity),
                Hsla::new(p.hue, 1.0, 0.5, 0.0),
            );
        }

        let links = self.connect(intensity, surface);
        FrameStats {
            particles: self.field.len(),
            links,
        }
    }

    // O(n²) over the field; n is bounded by the density constant.
    fn connect(&self, intensity: f32, surface: &mut dyn Surface) -> usize {
        let threshold = link_threshold(intensity);
        let hue = link_hue(intensity);
        let width = link_width(intensity);
        let particles = self.field.particles();
        let mut links = 0;

        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                let distance = a.pos.distance(b.pos);
                if distance < threshold {
                    let opacity = link_opacity(distance, threshold, intensity);
                    surface.stroke_line(a.pos, b.pos, width, Hsla::new(hue, 1.0, 0.6, opacity));
                    links += 1;
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use eframe::egui::Pos2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn link_opacity_profile() {
        assert_relative_eq!(link_opacity(75.0, 150.0, 0.0), 0.15, epsilon = 1e-6);
        assert_eq!(link_opacity(150.0, 150.0, 0.0), 0.0);
        assert_eq!(link_opacity(400.0, 150.0, 1.0), 0.0);
        assert_relative_eq!(link_opacity(0.0, 250.0, 1.0), 1.0);
        assert_relative_eq!(link_opacity(1e-3, 150.0, 0.4), 0.58, epsilon = 1e-4);
    }

    #[test]
    fn audio_shapes_fade_and_links() {
        assert_relative_eq!(fade_alpha(0.0), 0.15);
        assert_relative_eq!(fade_alpha(1.0), 0.05, epsilon = 1e-6);
        assert_eq!(link_threshold(0.0), 150.0);
        assert_eq!(link_threshold(1.0), 250.0);
        assert_eq!(link_hue(1.0), 300.0);
        assert_eq!(link_width(0.5), 2.0);
    }

    #[test]
    fn regenerate_replaces_field() {
        let mut engine = ParticleEngine::new(StdRng::seed_from_u64(5), 12_000);
        assert!(engine.field().is_empty());
        engine.regenerate(1200, 800);
        assert_eq!(engine.field().len(), 80);
        engine.regenerate(600, 400);
        assert_eq!(engine.field().len(), 20);
    }

    #[test]
    fn set_bounds_keeps_positions() {
        let mut engine = ParticleEngine::new(StdRng::seed_from_u64(5), 12_000);
        engine.regenerate(1200, 800);
        let before: Vec<Pos2> = engine.field().particles().iter().map(|p| p.pos).collect();

        engine.set_bounds(300, 200);
        let after: Vec<Pos2> = engine.field().particles().iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
        assert_eq!(engine.field().bounds(), (300.0, 200.0));
    }
}
