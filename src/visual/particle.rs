use eframe::egui::{Pos2, Vec2};
use rand::Rng;

/// Canvas area (in pixels) per particle.
pub const DENSITY: u32 = 12_000;

/// Per-axis bound of the random velocity, before the audio boost.
pub const MAX_SPEED: f32 = 0.25;

/// Number of particles for a canvas of the given size.
pub fn particle_count(width: u32, height: u32, density: u32) -> usize {
    (width as u64 * height as u64 / density.max(1) as u64) as usize
}

/// Wraps `v` into `[0, extent)`; toroidal for any displacement.
pub fn wrap(v: f32, extent: f32) -> f32 {
    if extent <= 0.0 || !v.is_finite() {
        return 0.0;
    }
    let r = v.rem_euclid(extent);
    if r >= extent {
        0.0
    } else {
        r
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Pos2,
    pub vel: Vec2,
    pub base_size: f32,
    pub size: f32,
    pub base_opacity: f32,
    pub opacity: f32,
    /// Fixed at creation, in the violet-blue band.
    pub hue: f32,
}

fn random_velocity<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen_range(-MAX_SPEED..MAX_SPEED),
        rng.gen_range(-MAX_SPEED..MAX_SPEED),
    )
}

impl Particle {
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32) -> Self {
        let base_size = rng.gen_range(1.0..4.0);
        let base_opacity = rng.gen_range(0.3..0.8);
        Self {
            pos: Pos2::new(
                wrap(rng.gen::<f32>() * width, width),
                wrap(rng.gen::<f32>() * height, height),
            ),
            vel: random_velocity(rng),
            base_size,
            size: base_size,
            base_opacity,
            opacity: base_opacity,
            hue: rng.gen_range(270.0..300.0),
        }
    }

    /// Advances one frame at the given audio intensity.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        intensity: f32,
        width: f32,
        height: f32,
    ) {
        let boost = 1.0 + intensity * 3.0;
        self.vel = random_velocity(rng) * boost;
        self.pos += self.vel;
        self.pos.x = wrap(self.pos.x, width);
        self.pos.y = wrap(self.pos.y, height);

        let swell = 1.0 + intensity * 2.0;
        self.size = self.base_size * swell;
        self.opacity = (self.base_opacity * swell).min(1.0);
    }

    pub fn glow_radius(&self) -> f32 {
        self.size * 2.0
    }
}

/// Particles for one canvas-size epoch.
#[derive(Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleField {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32, density: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let particles = (0..particle_count(width, height, density))
            .map(|_| Particle::spawn(rng, w, h))
            .collect();
        Self {
            particles,
            width: w,
            height: h,
        }
    }

    /// Changes the wrap bounds without touching positions.
    pub fn set_bounds(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn count_follows_density() {
        assert_eq!(particle_count(1200, 800, DENSITY), 80);
        assert_eq!(particle_count(1920, 1080, DENSITY), 172);
        assert_eq!(particle_count(0, 800, DENSITY), 0);
        assert_eq!(particle_count(100, 100, DENSITY), 0);
    }

    #[test]
    fn wrap_is_toroidal() {
        assert_eq!(wrap(105.0, 100.0), 5.0);
        assert_eq!(wrap(-5.0, 100.0), 95.0);
        assert_eq!(wrap(100.0, 100.0), 0.0);
        assert_eq!(wrap(-1e-9, 100.0), 0.0);
        assert_eq!(wrap(12.0, 0.0), 0.0);
        assert!(wrap(-12345.678, 100.0) < 100.0);
    }

    #[test]
    fn spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = Particle::spawn(&mut rng, 640.0, 480.0);
            assert!((0.0..640.0).contains(&p.pos.x) && (0.0..480.0).contains(&p.pos.y));
            assert!((1.0..4.0).contains(&p.base_size));
            assert!((0.3..0.8).contains(&p.base_opacity));
            assert!((270.0..300.0).contains(&p.hue));
            assert!(p.vel.x.abs() <= MAX_SPEED && p.vel.y.abs() <= MAX_SPEED);
        }
    }

    #[test]
    fn update_keeps_particles_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = Particle::spawn(&mut rng, 50.0, 30.0);
        for start in [(-1e6, 1e6), (49.999, 29.999), (0.0, 0.0), (-0.1, 30.0)] {
            p.pos = Pos2::new(start.0, start.1);
            for _ in 0..10 {
                p.update(&mut rng, 1.0, 50.0, 30.0);
                assert!(p.pos.x >= 0.0 && p.pos.x < 50.0, "x = {}", p.pos.x);
                assert!(p.pos.y >= 0.0 && p.pos.y < 30.0, "y = {}", p.pos.y);
            }
        }
    }

    #[test]
    fn intensity_swells_size_and_opacity() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Particle::spawn(&mut rng, 100.0, 100.0);
        p.base_size = 2.0;
        p.base_opacity = 0.6;

        p.update(&mut rng, 0.0, 100.0, 100.0);
        assert_eq!((p.size, p.opacity), (2.0, 0.6));
        assert!(p.vel.x.abs() <= MAX_SPEED);

        p.update(&mut rng, 0.5, 100.0, 100.0);
        assert_eq!(p.size, 4.0);
        assert_eq!(p.opacity, 1.0);
        assert_eq!(p.glow_radius(), 8.0);
        assert!(p.vel.x.abs() <= MAX_SPEED * 2.5);
    }

    #[test]
    fn field_regenerates_with_area() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = ParticleField::generate(&mut rng, 1200, 800, DENSITY);
        assert_eq!(field.len(), 80);
        assert_eq!(field.bounds(), (1200.0, 800.0));
    }
}
