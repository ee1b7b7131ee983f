use eframe::egui;

pub struct Palette {
    pub bg: egui::Color32,
    pub fg: egui::Color32,
    pub stroke: egui::Color32,
    pub accent: egui::Color32,
}

impl Palette {
    pub fn new(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg: egui::Color32::from_rgb(24, 26, 30),
                fg: egui::Color32::from_gray(230),
                stroke: egui::Color32::from_gray(90),
                accent: egui::Color32::from_rgb(80, 140, 220),
            }
        } else {
            Self {
                bg: egui::Color32::from_rgb(244, 244, 246),
                fg: egui::Color32::from_gray(20),
                stroke: egui::Color32::from_gray(120),
                accent: egui::Color32::from_rgb(50, 110, 200),
            }
        }
    }
}

pub fn configure_theme(ctx: &egui::Context, is_dark: bool) {
    let mut style = (*ctx.style()).clone();
    let palette = Palette::new(is_dark);

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 24.0,
                egui::TextStyle::Body => 14.0,
                egui::TextStyle::Button => 14.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(10.0, 10.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    style.visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, palette.stroke);
    style.visuals.widgets.noninteractive.bg_fill = palette.bg;
    style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    style.visuals.widgets.noninteractive.rounding = egui::Rounding::same(3.0);

    style.visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, palette.stroke);
    style.visuals.widgets.inactive.rounding = egui::Rounding::same(3.0);
    style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, palette.fg);

    style.visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.5, palette.accent);
    style.visuals.widgets.hovered.rounding = egui::Rounding::same(3.0);

    style.visuals.widgets.active.bg_fill = palette.accent;
    style.visuals.widgets.active.rounding = egui::Rounding::same(3.0);

    style.visuals.selection.bg_fill = palette.accent;
    style.visuals.panel_fill = palette.bg;
    style.visuals.override_text_color = Some(palette.fg);

    ctx.set_style(style);
}
