//! WinRep - Windows Repair Toolbox
//!
//! Runs predefined repair actions through `winrep_actions.ps1` and shows
//! their output live.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // Hide console on Windows

mod repair;
mod theme;

use arboard::Clipboard;
use eframe::egui;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use repair::controller::{BRAND_URL, README_URL};
use repair::host::SystemHost;
use repair::list_view::ActionRow;
use repair::runner::Launcher;
use repair::settings::SCALE_PRESETS;
use repair::{AppState, Repaint, RepairSettings, ThemeMode, CATALOG};
use theme::{apply_theme, Theme};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_TITLE: &str = "WinRep - Windows Repair Toolbox";

const LEFT_PANEL_WIDTH: f32 = 190.0;
const RIGHT_PANEL_WIDTH: f32 = 400.0;

/// Detect system theme (Windows)
#[cfg(target_os = "windows")]
fn detect_system_theme() -> ThemeMode {
    // Query registry for AppsUseLightTheme
    // 0 = Dark, 1 = Light
    let output = repair::host::hidden_command("reg")
        .args([
            "query",
            r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
            "/v",
            "AppsUseLightTheme",
        ])
        .output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("0x0") {
            return ThemeMode::Dark;
        }
    }

    ThemeMode::Light
}

#[cfg(not(target_os = "windows"))]
fn detect_system_theme() -> ThemeMode {
    ThemeMode::Light
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("WinRep v{} starting", VERSION);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1120.0, 620.0])
            .with_min_inner_size([960.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

struct App {
    state: AppState,
    settings: RepairSettings,
    theme_mode: ThemeMode,
    theme: Theme,
    repaint: Repaint,
    copied_feedback: Option<Instant>,
    show_settings: bool,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = RepairSettings::load();
        let theme_mode = settings.theme.unwrap_or_else(detect_system_theme);

        let ctx = cc.egui_ctx.clone();
        let repaint: Repaint = Arc::new(move || ctx.request_repaint());

        let launcher = Launcher::from_settings(&settings);
        tracing::info!("repair script: {}", launcher.script.display());

        Self {
            state: AppState::new(&CATALOG, launcher, Box::new(SystemHost), Instant::now()),
            settings,
            theme_mode,
            theme: Theme::from_mode(theme_mode),
            repaint,
            copied_feedback: None,
            show_settings: false,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_mode = match self.theme_mode {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        };
        self.theme = Theme::from_mode(self.theme_mode);
        self.settings.theme = Some(self.theme_mode);
        self.save_settings();
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings.save() {
            tracing::warn!("could not save settings: {}", e);
        }
    }

    fn copy_log(&mut self) {
        let text = self.state.log().to_text();
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.copied_feedback = Some(Instant::now()),
            Err(e) => tracing::warn!("clipboard unavailable: {}", e),
        }
    }

    /// Plain bordered button used across the window
    fn button(&self, text: &str, width: f32) -> egui::Button<'static> {
        egui::Button::new(egui::RichText::new(text).size(11.0).color(self.theme.text))
            .fill(self.theme.card)
            .stroke(egui::Stroke::new(1.0, self.theme.border))
            .rounding(6.0)
            .min_size(egui::vec2(width, 30.0))
    }

    fn primary_button(&self, text: &str, width: f32) -> egui::Button<'static> {
        egui::Button::new(
            egui::RichText::new(text)
                .size(11.0)
                .strong()
                .color(egui::Color32::WHITE),
        )
        .fill(self.theme.accent)
        .stroke(egui::Stroke::NONE)
        .rounding(6.0)
        .min_size(egui::vec2(width, 30.0))
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply UI scale
        ctx.set_pixels_per_point(self.settings.ui_scale);

        // Handle Ctrl+scroll for zoom
        let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
        let ctrl_held = ctx.input(|i| i.modifiers.ctrl);
        if ctrl_held && scroll_delta != 0.0 {
            let delta = if scroll_delta > 0.0 { 0.1 } else { -0.1 };
            self.settings.adjust_scale(delta);
        }

        apply_theme(ctx, self.theme_mode, &self.theme);

        let now = Instant::now();
        if let Some(wait) = self.state.pump(now, &self.repaint) {
            ctx.request_repaint_after(wait);
        }

        if let Some(instant) = self.copied_feedback {
            if instant.elapsed() >= Duration::from_secs(2) {
                self.copied_feedback = None;
            } else {
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }

        let modal_open = self.state.dialog().is_some();

        self.show_footer(ctx, modal_open);
        self.show_categories(ctx, modal_open);
        self.show_info_panel(ctx, modal_open);
        self.show_actions(ctx, modal_open, now);

        if self.show_settings {
            self.show_settings_popup(ctx);
        }
        self.show_dialogs(ctx);
    }
}

impl App {
    fn show_categories(&mut self, ctx: &egui::Context, modal_open: bool) {
        egui::SidePanel::left("categories")
            .exact_width(LEFT_PANEL_WIDTH)
            .resizable(false)
            .show_separator_line(false)
            .frame(egui::Frame::none().fill(self.theme.window).inner_margin(egui::Margin {
                left: 16.0,
                right: 8.0,
                top: 8.0,
                bottom: 8.0,
            }))
            .show(ctx, |ui| {
                if modal_open {
                    ui.disable();
                }
                ui.label(
                    egui::RichText::new("Categories")
                        .size(13.0)
                        .strong()
                        .color(self.theme.text),
                );
                ui.add_space(6.0);

                let categories = self.state.categories().to_vec();
                for category in &categories {
                    let active = category == self.state.category();
                    let btn = egui::Button::new(
                        egui::RichText::new(category).size(11.0).color(self.theme.text),
                    )
                    .fill(if active { self.theme.card_selected } else { self.theme.card })
                    .stroke(egui::Stroke::new(
                        1.0,
                        if active { self.theme.border_selected } else { self.theme.border },
                    ))
                    .rounding(6.0)
                    .min_size(egui::vec2(ui.available_width(), 34.0));

                    if ui.add(btn).clicked() {
                        self.state.select_category(category);
                    }
                    ui.add_space(2.0);
                }

                // Brand box pinned to the bottom
                ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                    egui::Frame::none()
                        .fill(self.theme.card)
                        .stroke(egui::Stroke::new(1.0, self.theme.border))
                        .rounding(18.0)
                        .show(ui, |ui| {
                            ui.set_min_size(egui::vec2(ui.available_width(), 120.0));
                            ui.centered_and_justified(|ui| {
                                let logo = ui
                                    .add(
                                        egui::Label::new(
                                            egui::RichText::new("SD-ITLAB")
                                                .size(11.0)
                                                .strong()
                                                .color(self.theme.text_dim),
                                        )
                                        .sense(egui::Sense::click()),
                                    )
                                    .on_hover_cursor(egui::CursorIcon::PointingHand);
                                if logo.clicked() {
                                    self.state.open_link(BRAND_URL);
                                }
                            });
                        });
                });
            });
    }

    fn show_actions(&mut self, ctx: &egui::Context, modal_open: bool, now: Instant) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.window).inner_margin(egui::Margin::symmetric(8.0, 8.0)))
            .show(ctx, |ui| {
                if modal_open {
                    ui.disable();
                }
                ui.label(
                    egui::RichText::new("Select an action")
                        .size(17.0)
                        .strong()
                        .color(self.theme.text),
                );
                ui.add_space(8.0);

                self.state.on_list_resize(ui.available_width(), now);

                let rows = self.state.list().rows().to_vec();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for row in &rows {
                            self.render_action_card(ui, row);
                        }
                    });
            });
    }

    fn render_action_card(&mut self, ui: &mut egui::Ui, row: &ActionRow) {
        let (fill, border) = if row.selected {
            (self.theme.card_selected, self.theme.border_selected)
        } else {
            (self.theme.card, self.theme.border)
        };
        let card_width = (self.state.list().row_width() - 24.0).max(0.0);
        let wrap_width = self.state.list().wrap_width();

        let response = egui::Frame::none()
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, border))
            .rounding(14.0)
            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
            .show(ui, |ui| {
                ui.set_width(card_width);
                ui.label(
                    egui::RichText::new(row.action.title)
                        .size(12.0)
                        .strong()
                        .color(self.theme.text),
                );
                ui.scope(|ui| {
                    ui.set_max_width(wrap_width);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(row.action.description)
                                .size(10.0)
                                .color(self.theme.text_dim),
                        )
                        .wrap(),
                    );
                });
                if let Some(command) = row.action.command {
                    ui.label(
                        egui::RichText::new(command)
                            .size(9.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_dim),
                    );
                }
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);

        if response.clicked() {
            let event = self.state.list().activate(row.action.key);
            self.state.handle_list_event(event);
        }

        ui.add_space(8.0);
    }

    fn show_info_panel(&mut self, ctx: &egui::Context, modal_open: bool) {
        egui::SidePanel::right("info")
            .exact_width(RIGHT_PANEL_WIDTH)
            .resizable(false)
            .show_separator_line(false)
            .frame(egui::Frame::none().fill(self.theme.window).inner_margin(egui::Margin {
                left: 4.0,
                right: 16.0,
                top: 8.0,
                bottom: 8.0,
            }))
            .show(ctx, |ui| {
                if modal_open {
                    ui.disable();
                }

                // Header with settings button
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("SD - TechTools")
                            .size(18.0)
                            .strong()
                            .color(self.theme.text),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let settings_btn = self.button("Settings", 70.0);
                        if ui.add(settings_btn).clicked() {
                            if self.show_settings {
                                self.save_settings();
                            }
                            self.show_settings = !self.show_settings;
                        }
                    });
                });
                ui.add_space(6.0);

                // System info
                egui::Frame::none()
                    .fill(self.theme.info_panel)
                    .stroke(egui::Stroke::new(1.0, self.theme.border))
                    .rounding(18.0)
                    .inner_margin(egui::Margin::symmetric(12.0, 10.0))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        egui::Grid::new("system_info")
                            .num_columns(2)
                            .spacing([12.0, 2.0])
                            .show(ui, |ui| {
                                for (label, value) in self.state.snapshot().fields() {
                                    ui.label(
                                        egui::RichText::new(label)
                                            .size(10.0)
                                            .color(self.theme.text_dim),
                                    );
                                    ui.add(
                                        egui::Label::new(
                                            egui::RichText::new(value)
                                                .size(11.0)
                                                .color(self.theme.text),
                                        )
                                        .wrap(),
                                    );
                                    ui.end_row();
                                }
                            });
                    });

                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("Current log:")
                        .size(11.0)
                        .strong()
                        .color(self.theme.text),
                );
                ui.add_space(2.0);

                egui::Frame::none()
                    .fill(self.theme.card)
                    .stroke(egui::Stroke::new(1.0, self.theme.border))
                    .rounding(8.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        egui::ScrollArea::vertical()
                            .auto_shrink([false, false])
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for line in self.state.log().lines() {
                                    ui.add(
                                        egui::Label::new(
                                            egui::RichText::new(line)
                                                .size(10.0)
                                                .family(egui::FontFamily::Monospace)
                                                .color(self.theme.text),
                                        )
                                        .wrap(),
                                    );
                                }
                            });
                    });
            });
    }

    fn show_footer(&mut self, ctx: &egui::Context, modal_open: bool) {
        egui::TopBottomPanel::bottom("footer")
            .show_separator_line(false)
            .frame(egui::Frame::none().fill(self.theme.window).inner_margin(egui::Margin {
                left: 16.0,
                right: 16.0,
                top: 4.0,
                bottom: 8.0,
            }))
            .show(ctx, |ui| {
                if modal_open {
                    ui.disable();
                }
                ui.add(
                    egui::ProgressBar::new(self.state.progress())
                        .desired_width(ui.available_width())
                        .fill(self.theme.accent),
                );
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(self.state.status())
                            .size(10.0)
                            .color(self.theme.text_dim),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(self.button("Close", 110.0)).clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }

                        let running = self.state.is_running();
                        let run_text = if running { "Running..." } else { "Run action" };
                        let run_btn = self.primary_button(run_text, 130.0);
                        if ui.add_enabled(!running, run_btn).clicked() {
                            self.state.run_selected(&self.repaint);
                        }

                        let copy_text = if self.copied_feedback.is_some() { "Copied!" } else { "Copy log" };
                        if ui.add(self.button(copy_text, 100.0)).clicked() {
                            self.copy_log();
                        }

                        if ui.add(self.button("Readme", 100.0)).clicked() {
                            self.state.open_link(README_URL);
                        }

                        ui.add_space(10.0);
                        let brand = ui
                            .add(
                                egui::Label::new(
                                    egui::RichText::new(format!("v{VERSION} · © 2026 SD-ITLab · MIT licensed"))
                                        .size(10.0)
                                        .color(self.theme.text_dim),
                                )
                                .sense(egui::Sense::click()),
                            )
                            .on_hover_cursor(egui::CursorIcon::PointingHand);
                        if brand.clicked() {
                            self.state.open_link(BRAND_URL);
                        }
                    });
                });
            });
    }

    fn show_settings_popup(&mut self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("settings_popup"))
            .anchor(egui::Align2::RIGHT_TOP, [-20.0, 44.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(self.theme.card)
                    .stroke(egui::Stroke::new(1.0, self.theme.border))
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_min_width(200.0);

                        ui.label(
                            egui::RichText::new("Theme")
                                .size(10.0)
                                .strong()
                                .color(self.theme.text_dim),
                        );
                        let toggle_text = match self.theme_mode {
                            ThemeMode::Light => "Switch to dark",
                            ThemeMode::Dark => "Switch to light",
                        };
                        if ui.add(self.button(toggle_text, 120.0)).clicked() {
                            self.toggle_theme();
                        }

                        ui.add_space(8.0);
                        ui.add(egui::Separator::default().spacing(1.0));
                        ui.add_space(8.0);

                        ui.label(
                            egui::RichText::new(format!("Scale ({})", self.settings.format_scale()))
                                .size(10.0)
                                .strong()
                                .color(self.theme.text_dim),
                        );
                        ui.horizontal(|ui| {
                            for (i, (_, label)) in SCALE_PRESETS.iter().enumerate() {
                                let is_selected = self.settings.current_scale_index() == Some(i);
                                let btn = egui::Button::new(
                                    egui::RichText::new(*label).size(9.0).color(if is_selected {
                                        egui::Color32::WHITE
                                    } else {
                                        self.theme.text
                                    }),
                                )
                                .fill(if is_selected { self.theme.accent } else { self.theme.card })
                                .stroke(egui::Stroke::new(1.0, self.theme.border))
                                .rounding(4.0)
                                .min_size(egui::vec2(40.0, 20.0));

                                if ui.add(btn).clicked() {
                                    self.settings.set_scale_preset(i);
                                }
                            }
                        });
                        ui.add_space(3.0);
                        ui.label(
                            egui::RichText::new("Ctrl+Scroll to adjust")
                                .size(8.0)
                                .color(self.theme.text_dim),
                        );
                    });
            });
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(dialog) = self.state.dialog() {
            let mut answer = None;
            egui::Window::new(dialog.title())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(dialog.message()).color(self.theme.text));
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.add(self.primary_button("Yes", 80.0)).clicked() {
                            answer = Some(true);
                        }
                        if ui.add(self.button("No", 80.0)).clicked() {
                            answer = Some(false);
                        }
                    });
                });
            if let Some(accepted) = answer {
                self.state.answer_dialog(accepted, &self.repaint);
            }
        }

        let mut dismiss = false;
        if let Some(notice) = self.state.notice() {
            egui::Window::new("Info")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(notice).color(self.theme.text));
                    ui.add_space(10.0);
                    if ui.add(self.button("OK", 80.0)).clicked() {
                        dismiss = true;
                    }
                });
        }
        if dismiss {
            self.state.dismiss_notice();
        }
    }
}
