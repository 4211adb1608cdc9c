//! Settings view implementation
//!
//! Persisted defaults (startup chain, per-chain RPC overrides, tick interval,
//! overlap cap) plus the file locations.

use crate::config::{clamp_in_flight_ticks, find_chain_by_key, CHAINS, MAX_IN_FLIGHT_TICKS};
use crate::gui::app::{GuiApp, SettingsFormState};
use crate::utils::parse_interval_ms;
use eframe::egui::{self, RichText};

impl GuiApp {
    pub(crate) fn view_settings(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[*]", "SETTINGS");
        ui.add_space(self.theme.spacing_md);

        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Defaults").size(18.0).strong());
            ui.add_space(self.theme.spacing_sm);

            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_sm])
                .show(ui, |ui| {
                    ui.label("Startup chain:");
                    let current_label = find_chain_by_key(&self.settings_form.chain_key)
                        .map(|c| c.label)
                        .unwrap_or("Unknown");
                    egui::ComboBox::from_id_source("settings_chain")
                        .selected_text(current_label)
                        .show_ui(ui, |ui| {
                            for chain in CHAINS {
                                ui.selectable_value(&mut self.settings_form.chain_key, chain.key.to_string(), chain.label);
                            }
                        });
                    ui.end_row();

                    ui.label("Tick interval (ms):");
                    ui.add(egui::TextEdit::singleline(&mut self.settings_form.interval).desired_width(100.0));
                    ui.end_row();

                    ui.label("Max ticks in flight:");
                    ui.vertical(|ui| {
                        ui.add(egui::Slider::new(&mut self.settings_form.max_in_flight_ticks, 1..=MAX_IN_FLIGHT_TICKS));
                        ui.label(
                            RichText::new("1 = a tick is skipped while the previous one is still sending")
                                .small()
                                .color(self.theme.text_secondary),
                        );
                    });
                    ui.end_row();
                });
        });

        ui.add_space(self.theme.spacing_md);

        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Custom RPC").size(18.0).strong());
            ui.label(
                RichText::new("Saved per chain and pre-filled when the chain is selected. Leave empty to use the default.")
                    .small()
                    .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_sm);

            ui.horizontal(|ui| {
                let previous = self.settings_form.rpc_chain_key.clone();
                let label = find_chain_by_key(&previous).map(|c| c.label).unwrap_or("Unknown");
                egui::ComboBox::from_id_source("settings_rpc_chain")
                    .selected_text(label)
                    .show_ui(ui, |ui| {
                        for chain in CHAINS {
                            ui.selectable_value(&mut self.settings_form.rpc_chain_key, chain.key.to_string(), chain.label);
                        }
                    });
                if self.settings_form.rpc_chain_key != previous {
                    self.settings_form.rpc = self
                        .user_settings
                        .get_custom_rpc(&self.settings_form.rpc_chain_key)
                        .cloned()
                        .unwrap_or_default();
                }
                let hint = find_chain_by_key(&self.settings_form.rpc_chain_key)
                    .map(|c| c.default_rpc)
                    .unwrap_or_default();
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_form.rpc)
                        .desired_width(420.0)
                        .hint_text(hint),
                );
            });
            let overrides = self.user_settings.custom_rpcs.len();
            if overrides > 0 {
                ui.label(
                    RichText::new(format!("{} chain(s) with a custom RPC", overrides))
                        .small()
                        .color(self.theme.text_secondary),
                );
            }
        });

        ui.add_space(self.theme.spacing_md);

        ui.horizontal(|ui| {
            if ui.add(self.theme.button_primary("Save Settings")).clicked() {
                self.save_settings();
            }
            if ui.add(self.theme.button_secondary("Revert")).clicked() {
                self.settings_form = SettingsFormState::from_settings(&self.user_settings);
            }
            if let Some(error) = &self.settings_form.error {
                ui.label(RichText::new(error).color(self.theme.error));
            }
        });
        ui.label(
            RichText::new("The startup chain takes effect on the next launch.")
                .small()
                .color(self.theme.text_secondary),
        );

        ui.add_space(self.theme.spacing_lg);
        self.render_about_panel(ui);
    }

    fn save_settings(&mut self) {
        let interval = match parse_interval_ms(&self.settings_form.interval) {
            Ok(ms) => ms,
            Err(e) => {
                self.settings_form.error = Some(e.to_string());
                return;
            }
        };
        self.settings_form.error = None;

        self.user_settings.selected_chain = self.settings_form.chain_key.clone();
        self.user_settings.default_interval_ms = interval;
        self.user_settings.max_in_flight_ticks = clamp_in_flight_ticks(self.settings_form.max_in_flight_ticks);
        let rpc_chain = self.settings_form.rpc_chain_key.clone();
        self.user_settings.set_custom_rpc(&rpc_chain, self.settings_form.rpc.clone());

        match self.user_settings.save() {
            Ok(()) => self.notify("Settings saved."),
            Err(e) => self.notify(format!("Failed to save settings: {}", e)),
        }

        // Apply to the live form when idle
        if !self.session.is_running() {
            if self.session.set_max_in_flight_ticks(self.user_settings.max_in_flight_ticks).is_err() {
                tracing::debug!("Run started while saving settings; overlap cap applies next run");
            }
            if rpc_chain == self.session.chain().key {
                self.form.rpc = self.user_settings.get_custom_rpc(&rpc_chain).cloned().unwrap_or_default();
                self.apply_rpc();
            }
        }
    }

    fn render_about_panel(&mut self, ui: &mut egui::Ui) {
        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("About Inscriber").size(16.0).strong());
            ui.add_space(self.theme.spacing_sm);

            egui::Grid::new("about_grid")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_xs])
                .show(ui, |ui| {
                    ui.label(RichText::new("Version:").color(self.theme.text_secondary));
                    ui.label(RichText::new(env!("CARGO_PKG_VERSION")).strong().color(self.theme.primary));
                    ui.end_row();

                    ui.label(RichText::new("Settings file:").color(self.theme.text_secondary));
                    let settings_path = crate::user_settings::UserSettings::settings_path_display();
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&settings_path).small().color(self.theme.text_secondary));
                        if ui.add(egui::Button::new("📋").small()).on_hover_text("Copy path").clicked() {
                            ui.output_mut(|o| o.copied_text = settings_path.clone());
                        }
                    });
                    ui.end_row();

                    ui.label(RichText::new("Operation log:").color(self.theme.text_secondary));
                    let log_path = crate::operation_log::log_file_path();
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&log_path).small().color(self.theme.text_secondary));
                        if ui.add(egui::Button::new("📋").small()).on_hover_text("Copy path").clicked() {
                            ui.output_mut(|o| o.copied_text = log_path.clone());
                        }
                        if ui.add(egui::Button::new("📂").small()).on_hover_text("Open log file").clicked() {
                            if let Err(e) = open::that(&log_path) {
                                tracing::warn!("Failed to open operation log: {}", e);
                            }
                        }
                    });
                    ui.end_row();
                });
        });
    }
}
