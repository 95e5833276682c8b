//! 2D drawing surface and the software canvas behind it.

use eframe::egui::Pos2;

/// Hue in degrees; saturation, lightness and alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Hsla {
    pub const fn new(h: f32, s: f32, l: f32, a: f32) -> Self {
        Self { h, s, l, a }
    }

    pub fn to_rgb(self) -> [f32; 3] {
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let hp = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let m = self.l - c / 2.0;

        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        [r + m, g + m, b + m]
    }
}

/// Drawing operations the particle engine needs from a canvas.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Blends `rgb` at `alpha` over the whole surface.
    fn fill(&mut self, rgb: [f32; 3], alpha: f32);

    /// Filled circle whose color runs from `inner` at the center to `outer` at `radius`.
    fn radial_glow(&mut self, center: Pos2, radius: f32, inner: Hsla, outer: Hsla);

    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Hsla);
}

/// Persistent RGB pixel buffer with source-over blending.
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 3]; width as usize * height as usize],
        }
    }

    /// Reallocates the backing store; contents are cleared to black.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 3]; width as usize * height as usize];
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Writes the canvas as opaque RGBA8 into `out`.
    pub fn write_rgba(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.pixels.len() * 4);
        for p in &self.pixels {
            out.extend(p.iter().map(|&c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            out.push(255);
        }
    }

    #[inline]
    fn blend(&mut self, x: i64, y: i64, rgb: [f32; 3], alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || alpha <= 0.0 {
            return;
        }
        let a = alpha.min(1.0);
        let p = &mut self.pixels[(y as usize) * self.width as usize + x as usize];
        for (dst, src) in p.iter_mut().zip(rgb) {
            *dst = *dst * (1.0 - a) + src * a;
        }
    }
}

impl Surface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, rgb: [f32; 3], alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        for p in &mut self.pixels {
            for (dst, src) in p.iter_mut().zip(rgb) {
                *dst = *dst * (1.0 - a) + src * a;
            }
        }
    }

    fn radial_glow(&mut self, center: Pos2, radius: f32, inner: Hsla, outer: Hsla) {
        if radius <= 0.0 {
            return;
        }
        let (c0, c1) = (inner.to_rgb(), outer.to_rgb());

        let x0 = (center.x - radius).floor() as i64;
        let x1 = (center.x + radius).ceil() as i64;
        let y0 = (center.y - radius).floor() as i64;
        let y1 = (center.y + radius).ceil() as i64;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                if t >= 1.0 {
                    continue;
                }
                let rgb = [
                    c0[0] + (c1[0] - c0[0]) * t,
                    c0[1] + (c1[1] - c0[1]) * t,
                    c0[2] + (c1[2] - c0[2]) * t,
                ];
                self.blend(x, y, rgb, inner.a + (outer.a - inner.a) * t);
            }
        }
    }

    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Hsla) {
        let d = to - from;
        let len = d.length();
        if len <= f32::EPSILON || color.a <= 0.0 {
            return;
        }
        let rgb = color.to_rgb();
        let half = width / 2.0;

        //
        // Walk the major axis; cover the perpendicular span once per column/row.
        //
        let steep = d.y.abs() > d.x.abs();
        let (a, b) = if steep {
            ((from.y, from.x), (to.y, to.x))
        } else {
            ((from.x, from.y), (to.x, to.y))
        };
        let (a, b) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        let slope = (b.1 - a.1) / (b.0 - a.0);
        // Perpendicular distance grows by cos(angle) per unit along the minor axis.
        let cos = (b.0 - a.0).abs() / len;
        let reach = half / cos.max(f32::EPSILON) + 1.0;

        for major in (a.0.floor() as i64)..=(b.0.ceil() as i64) {
            let m = (major as f32 + 0.5).clamp(a.0, b.0);
            let center = a.1 + (m - a.0) * slope;
            for minor in ((center - reach).floor() as i64)..=((center + reach).ceil() as i64) {
                let dist = ((minor as f32 + 0.5) - center).abs() * cos;
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let (x, y) = if steep { (minor, major) } else { (major, minor) };
                self.blend(x, y, rgb, color.a * coverage);
            }
        }
    }
}
