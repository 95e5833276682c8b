use eframe::egui;

pub const BACKDROP: egui::Color32 = egui::Color32::BLACK;
pub const BADGE_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(47, 10, 74, 204);
pub const BADGE_STROKE: egui::Color32 = egui::Color32::from_rgb(168, 85, 247);
pub const BADGE_TEXT: egui::Color32 = egui::Color32::from_rgb(233, 213, 255);

pub fn setup_global_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    //
    // The canvas fills the whole window; panels stay black behind it.
    //
    style.visuals = egui::Visuals::dark();
    style.visuals.panel_fill = BACKDROP;
    style.visuals.window_fill = BACKDROP;

    ctx.set_style(style);
}

/// Pill in the bottom-right corner shown while the visualizer is active.
pub fn draw_activity_indicator(ctx: &egui::Context, active: bool) {
    if !active {
        return;
    }

    egui::Area::new(egui::Id::new("activity-indicator"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-24.0, -24.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(BADGE_FILL)
                .stroke(egui::Stroke::new(1.0, BADGE_STROKE))
                .rounding(16.0)
                .inner_margin(egui::Margin::symmetric(16.0, 8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        //
                        // Pulsing dot.
                        //
                        let t = ui.input(|i| i.time) as f32;
                        let pulse = 0.5 + 0.5 * (t * 4.0).sin();
                        let (rect, _) =
                            ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                        ui.painter().circle_filled(
                            rect.center(),
                            3.0 + 3.0 * pulse,
                            BADGE_STROKE.gamma_multiply(0.75 * (1.0 - pulse)),
                        );
                        ui.painter().circle_filled(rect.center(), 4.0, BADGE_STROKE);

                        ui.label(
                            egui::RichText::new("Audio Visualizer Active")
                                .color(BADGE_TEXT)
                                .size(13.0),
                        );
                    });
                });
        });
}

/// Key legend in the bottom-left corner.
pub fn draw_controls_hint(ctx: &egui::Context, playing: bool, volume: f32) {
    egui::Area::new(egui::Id::new("controls-hint"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(24.0, -24.0))
        .interactable(false)
        .show(ctx, |ui| {
            let action = if playing { "pause" } else { "play" };
            ui.label(
                egui::RichText::new(format!(
                    "Space: {}   Up/Down: volume {:.0}%   D: disconnect   R: restart",
                    action,
                    volume * 100.0
                ))
                .color(egui::Color32::from_gray(140))
                .size(11.0),
            );
        });
}
