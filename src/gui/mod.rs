pub mod theme;

use crate::audio::AudioGraph;
use crate::player::{Transport, VOLUME_STEP};
use crate::visual::{FrameClock, RenderSurface, Surface};
use eframe::egui;
use std::rc::Rc;

impl FrameClock for egui::Context {
    fn request_frame(&self) {
        self.request_repaint();
    }
}

pub struct VisualizerApp {
    //
    // Shared audio graph and the playback stand-in driving it.
    //
    graph: Rc<AudioGraph>,
    transport: Transport,

    //
    // Render surface and the texture its canvas is uploaded to.
    //
    surface: RenderSurface,
    mounted: bool,
    rgba_buf: Vec<u8>,
    texture: Option<egui::TextureHandle>,
}

impl VisualizerApp {
    pub fn new(
        _cc: &eframe::CreationContext,
        graph: Rc<AudioGraph>,
        transport: Transport,
        surface: RenderSurface,
    ) -> Self {
        Self {
            graph,
            transport,
            surface,
            mounted: false,
            rgba_buf: Vec::new(),
            texture: None,
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (space, disconnect, restart, louder, quieter) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::D),
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });

        if space {
            self.transport.toggle_play(&*self.graph);
        }
        if disconnect {
            self.graph.disconnect();
        }
        if restart {
            self.surface.stop();
            self.surface.start(viewport_size(ctx), ctx);
        }
        if louder {
            self.transport.adjust_volume(VOLUME_STEP);
        }
        if quieter {
            self.transport.adjust_volume(-VOLUME_STEP);
        }
    }

    fn upload_canvas(&mut self, ctx: &egui::Context) {
        let canvas = self.surface.canvas();
        if canvas.is_empty() {
            return;
        }

        let (width, height) = canvas.size();
        canvas.write_rgba(&mut self.rgba_buf);
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [width as usize, height as usize],
            &self.rgba_buf,
        );

        if let Some(texture) = &mut self.texture {
            texture.set(image, egui::TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture("particles", image, egui::TextureOptions::LINEAR));
        }
    }
}

fn viewport_size(ctx: &egui::Context) -> (u32, u32) {
    // Logical points, not physical pixels; the texture is stretched on HiDPI.
    let size = ctx.screen_rect().size();
    (size.x.max(0.0).round() as u32, size.y.max(0.0).round() as u32)
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        //
        // Mount the render surface once the viewport size is known.
        //
        if !self.mounted {
            self.surface.start(viewport_size(ctx), ctx);
            self.mounted = true;
        }

        self.handle_input(ctx);

        //
        // Track viewport changes, then run the scheduled frame.
        //
        let (width, height) = viewport_size(ctx);
        self.surface.resize(width, height);

        if self.surface.frame(&*self.graph, ctx).is_some() {
            self.upload_canvas(ctx);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::BACKDROP))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        ui.max_rect(),
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            });

        theme::draw_activity_indicator(ctx, self.graph.is_active());
        theme::draw_controls_hint(ctx, self.transport.is_playing(), self.transport.volume());
    }
}

impl Drop for VisualizerApp {
    fn drop(&mut self) {
        self.surface.stop();
    }
}
