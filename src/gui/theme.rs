use egui::{Color32, Context, Rounding, Stroke, Visuals};

/// Indigo accent used for primary actions
pub const ACCENT: Color32 = Color32::from_rgb(79, 70, 229);
/// Green of the download action
pub const SUCCESS: Color32 = Color32::from_rgb(22, 163, 74);
/// Red of the error banner
pub const ERROR: Color32 = Color32::from_rgb(185, 28, 28);

#[derive(PartialEq, Clone, Copy)]
pub enum Theme {
    Light,
    Dark,
}

/// Apply the selected theme
pub fn apply_theme(ctx: &Context, theme: Theme) {
    match theme {
        Theme::Light => setup_custom_theme(ctx),
        Theme::Dark => ctx.set_visuals(Visuals::dark()),
    }
}

/// Slate and indigo light theme
pub fn setup_custom_theme(ctx: &Context) {
    let mut visuals = Visuals::light();

    visuals.panel_fill = Color32::from_rgb(248, 250, 252);
    visuals.window_fill = Color32::WHITE;

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(241, 245, 249);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(71, 85, 105));
    visuals.widgets.active.bg_fill = Color32::from_rgb(224, 231, 255);
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::from_rgb(49, 46, 129));

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = ACCENT;

    let rounding = Rounding::same(8.0);
    visuals.window_rounding = rounding;
    visuals.menu_rounding = rounding;

    ctx.set_visuals(visuals);
}
