//! Theme and styling for the GUI
//!
//! Provides the AppTheme struct with colors, spacing and styled widget factories.

use eframe::egui;

#[derive(Clone, Copy)]
pub struct AppTheme {
    // Base colors
    pub background: egui::Color32,
    pub surface: egui::Color32,
    pub surface_hover: egui::Color32,
    pub surface_active: egui::Color32,
    pub panel_fill: egui::Color32,
    pub text_primary: egui::Color32,
    pub text_secondary: egui::Color32,

    // Semantic colors
    pub primary: egui::Color32,
    pub secondary: egui::Color32,
    pub success: egui::Color32,
    pub warning: egui::Color32,
    pub error: egui::Color32,

    // Accents
    pub accent_link: egui::Color32,
    pub accent_ink: egui::Color32,

    // Spacing scale
    pub spacing_xs: f32,
    pub spacing_sm: f32,
    pub spacing_md: f32,
    pub spacing_lg: f32,

    // Button sizes
    pub button_small: egui::Vec2,
    pub button_medium: egui::Vec2,
    pub button_large: egui::Vec2,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            // Ink on parchment, dark mode: near-black surfaces with amber highlights
            background: egui::Color32::from_rgb(10, 10, 12),
            surface: egui::Color32::from_rgb(18, 18, 22),
            surface_hover: egui::Color32::from_rgb(28, 28, 34),
            surface_active: egui::Color32::from_rgb(40, 40, 48),
            panel_fill: egui::Color32::from_rgb(14, 14, 17),
            text_primary: egui::Color32::from_rgb(235, 225, 200),
            text_secondary: egui::Color32::from_rgb(150, 145, 135),

            primary: egui::Color32::from_rgb(255, 183, 3), // amber #ffb703
            secondary: egui::Color32::from_rgb(70, 70, 80),
            success: egui::Color32::from_rgb(60, 200, 120),
            warning: egui::Color32::from_rgb(255, 140, 0),
            error: egui::Color32::from_rgb(240, 80, 80),

            accent_link: egui::Color32::from_rgb(110, 170, 255),
            accent_ink: egui::Color32::from_rgb(140, 110, 255),

            spacing_xs: 4.0,
            spacing_sm: 8.0,
            spacing_md: 16.0,
            spacing_lg: 24.0,

            button_small: egui::vec2(90.0, 24.0),
            button_medium: egui::vec2(140.0, 32.0),
            button_large: egui::vec2(200.0, 42.0),
        }
    }
}

impl AppTheme {
    /// Outlined button in the primary color
    pub fn button_primary(&self, text: &str) -> egui::Button<'_> {
        egui::Button::new(egui::RichText::new(text).color(self.text_primary).strong())
            .fill(self.surface)
            .stroke(egui::Stroke::new(2.0, self.primary))
            .min_size(self.button_medium)
    }

    pub fn button_secondary(&self, text: &str) -> egui::Button<'_> {
        egui::Button::new(egui::RichText::new(text).color(self.text_primary))
            .fill(self.surface)
            .stroke(egui::Stroke::new(1.0, self.secondary))
            .min_size(self.button_small)
    }

    /// The big start/stop button. Filled while a run is active.
    pub fn button_run(&self, running: bool) -> egui::Button<'static> {
        let (label, fill, stroke) = if running {
            ("■ Stop", self.error, self.error)
        } else {
            ("▶ Start", self.surface, self.success)
        };
        egui::Button::new(egui::RichText::new(label).size(18.0).strong().color(self.text_primary))
            .fill(fill)
            .stroke(egui::Stroke::new(3.0, stroke))
            .min_size(self.button_large)
    }

    /// Frame for panels/cards
    pub fn frame_panel(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.panel_fill)
            .rounding(4.0)
            .inner_margin(self.spacing_md)
            .stroke(egui::Stroke::new(1.0, self.surface_active))
    }

    /// Color for a log row status
    pub fn status_color(&self, success: bool) -> egui::Color32 {
        if success {
            self.success
        } else {
            self.error
        }
    }

    /// Color for an RPC round-trip time
    pub fn latency_color(&self, latency_ms: u64) -> egui::Color32 {
        if latency_ms < 300 {
            self.success
        } else if latency_ms < 1500 {
            self.warning
        } else {
            self.error
        }
    }

    pub fn section_header_text(&self, icon: &str, title: &str) -> String {
        format!("{} {}", icon, title)
    }
}

/// Configure the egui context style with the given theme
pub fn configure_style(ctx: &egui::Context, theme: &AppTheme) {
    let mut visuals = egui::Visuals::dark();
    visuals.window_fill = theme.background;
    visuals.panel_fill = theme.panel_fill;
    visuals.override_text_color = Some(theme.text_primary);

    visuals.widgets.noninteractive.bg_fill = theme.surface;
    visuals.widgets.inactive.bg_fill = theme.surface;
    visuals.widgets.hovered.bg_fill = theme.surface_hover;
    visuals.widgets.active.bg_fill = theme.surface_active;
    visuals.widgets.open.bg_fill = theme.surface_active;

    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, theme.secondary);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, theme.primary);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(2.0, theme.primary);
    visuals.selection.bg_fill = theme.surface_active;
    visuals.selection.stroke = egui::Stroke::new(1.0, theme.primary);
    visuals.hyperlink_color = theme.accent_link;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(20.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Monospace,
        egui::FontId::new(13.0, egui::FontFamily::Monospace),
    );
    ctx.set_style(style);
}
