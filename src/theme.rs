//! Card-based theme for egui
//!
//! Light palette follows the Windows 11 settings look; dark mirrors it.

use egui::Color32;

use crate::repair::ThemeMode;

#[derive(Clone, Copy)]
pub struct Theme {
    pub window: Color32,
    pub card: Color32,
    pub card_selected: Color32,
    pub border: Color32,
    pub border_selected: Color32,
    pub info_panel: Color32,
    pub hover: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub accent: Color32,
    pub track: Color32,
}

impl Theme {
    pub const LIGHT: Self = Self {
        window: Color32::from_rgb(0xf3, 0xf4, 0xf6),
        card: Color32::from_rgb(0xff, 0xff, 0xff),
        card_selected: Color32::from_rgb(0xe7, 0xf1, 0xff),
        border: Color32::from_rgb(0xe5, 0xe7, 0xeb),
        border_selected: Color32::from_rgb(0x3b, 0x82, 0xf6),
        info_panel: Color32::from_rgb(0xef, 0xf4, 0xff),
        hover: Color32::from_rgb(0xe5, 0xe7, 0xeb),
        text: Color32::from_rgb(0x11, 0x18, 0x27),
        text_dim: Color32::from_rgb(0x6b, 0x72, 0x80),
        accent: Color32::from_rgb(0x3b, 0x82, 0xf6),
        track: Color32::from_rgb(0xe5, 0xe7, 0xeb),
    };

    pub const DARK: Self = Self {
        window: Color32::from_rgb(0x14, 0x15, 0x18),
        card: Color32::from_rgb(0x1f, 0x21, 0x26),
        card_selected: Color32::from_rgb(0x1b, 0x2a, 0x45),
        border: Color32::from_rgb(0x33, 0x36, 0x3d),
        border_selected: Color32::from_rgb(0x3b, 0x82, 0xf6),
        info_panel: Color32::from_rgb(0x1a, 0x22, 0x33),
        hover: Color32::from_rgb(0x2a, 0x2d, 0x34),
        text: Color32::from_rgb(0xe5, 0xe7, 0xeb),
        text_dim: Color32::from_rgb(0x8b, 0x92, 0xa0),
        accent: Color32::from_rgb(0x3b, 0x82, 0xf6),
        track: Color32::from_rgb(0x33, 0x36, 0x3d),
    };

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::LIGHT,
            ThemeMode::Dark => Self::DARK,
        }
    }
}

/// Apply theme to egui visuals
pub fn apply_theme(ctx: &egui::Context, mode: ThemeMode, theme: &Theme) {
    let mut visuals = match mode {
        ThemeMode::Light => egui::Visuals::light(),
        ThemeMode::Dark => egui::Visuals::dark(),
    };

    visuals.panel_fill = theme.window;
    visuals.window_fill = theme.card;
    visuals.extreme_bg_color = theme.track;

    visuals.widgets.noninteractive.fg_stroke.color = theme.text;
    visuals.widgets.inactive.fg_stroke.color = theme.text;
    visuals.widgets.inactive.bg_fill = theme.card;
    visuals.widgets.inactive.weak_bg_fill = theme.card;
    visuals.widgets.hovered.weak_bg_fill = theme.hover;
    visuals.widgets.hovered.fg_stroke.color = theme.text;
    visuals.widgets.active.fg_stroke.color = theme.text;

    visuals.selection.bg_fill = theme.accent;

    ctx.set_visuals(visuals);
}
