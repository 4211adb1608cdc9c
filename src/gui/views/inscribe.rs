//! Inscribe view: accounts, transaction parameters and the start/stop control.

use crate::gui::app::GuiApp;
use crate::gui::helpers::{payload_size_label, send_rate_hint, truncate_chars};
use crate::utils::{checksum, shorten_address};
use eframe::egui::{self, RichText};

impl GuiApp {
    pub(crate) fn view_inscribe(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[>]", "INSCRIBE");
        ui.add_space(self.theme.spacing_md);

        ui.columns(2, |columns| {
            self.render_accounts_panel(&mut columns[0]);
            self.render_transaction_panel(&mut columns[1]);
        });

        ui.add_space(self.theme.spacing_md);
        self.render_run_controls(ui);

        ui.add_space(self.theme.spacing_md);
        self.view_log_panel(ui);
    }

    pub(crate) fn render_section_header(&self, ui: &mut egui::Ui, icon: &str, title: &str) {
        ui.label(
            RichText::new(self.theme.section_header_text(icon, title))
                .size(22.0)
                .strong()
                .color(self.theme.primary),
        );
        ui.separator();
    }

    fn render_accounts_panel(&mut self, ui: &mut egui::Ui) {
        let running = self.session.is_running();
        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("[K] Accounts").size(16.0).strong());
            ui.label(
                RichText::new("One private key (0x + 64 hex) or mnemonic phrase per line")
                    .small()
                    .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_xs);

            let response = ui.add_enabled(
                !running,
                egui::TextEdit::multiline(&mut self.form.keys)
                    .password(self.form.hide_keys)
                    .font(egui::TextStyle::Monospace)
                    .desired_rows(6)
                    .desired_width(f32::INFINITY)
                    .hint_text("0x...\ntwelve word mnemonic phrase ..."),
            );
            if response.changed() {
                self.apply_keys();
            }

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.form.hide_keys, "Hide");
                if ui
                    .add_enabled(!running, self.theme.button_secondary("📄 Load from file"))
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Text files", &["txt"])
                        .pick_file()
                    {
                        self.load_keys_from_file(&path);
                    }
                }
            });

            let parsed = self.session.parsed_accounts();
            let summary_color = if parsed.dropped > 0 {
                self.theme.warning
            } else {
                self.theme.text_secondary
            };
            ui.label(RichText::new(parsed.summary()).small().color(summary_color));

            if !parsed.is_empty() {
                let chain = self.session.chain();
                egui::ScrollArea::vertical()
                    .id_source("account_list")
                    .max_height(140.0)
                    .show(ui, |ui| {
                        for (i, account) in parsed.accounts.iter().enumerate() {
                            let full = checksum(&account.address());
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(format!("#{}", i + 1)).color(self.theme.text_secondary));
                                ui.monospace(shorten_address(&account.address()));
                                ui.label(RichText::new(account.kind().label()).small().color(self.theme.accent_ink));
                                if ui.add(egui::Button::new("📋").small()).on_hover_text("Copy address").clicked() {
                                    ui.output_mut(|o| o.copied_text = full.clone());
                                }
                                if ui.add(egui::Button::new("🔗").small()).on_hover_text("View on block explorer").clicked() {
                                    if let Err(e) = open::that(chain.address_url(&full)) {
                                        tracing::warn!("Failed to open explorer URL: {}", e);
                                    }
                                }
                            });
                        }
                    });
            }
        });
    }

    fn render_transaction_panel(&mut self, ui: &mut egui::Ui) {
        let running = self.session.is_running();
        let chain = self.session.chain();
        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("[T] Transaction").size(16.0).strong());
            ui.add_space(self.theme.spacing_xs);

            egui::Grid::new("transaction_grid")
                .num_columns(2)
                .spacing([self.theme.spacing_sm, self.theme.spacing_sm])
                .show(ui, |ui| {
                    ui.label("Recipient:");
                    ui.vertical(|ui| {
                        let response = ui.add_enabled(
                            !running,
                            egui::TextEdit::singleline(&mut self.form.recipient)
                                .font(egui::TextStyle::Monospace)
                                .desired_width(f32::INFINITY)
                                .hint_text("empty = each account sends to itself"),
                        );
                        if response.changed() {
                            self.apply_recipient();
                        }
                        if let Some(error) = &self.form.recipient_error {
                            ui.label(RichText::new(error).small().color(self.theme.error));
                        }
                    });
                    ui.end_row();

                    ui.label("RPC:");
                    ui.horizontal(|ui| {
                        let response = ui.add_enabled(
                            !running,
                            egui::TextEdit::singleline(&mut self.form.rpc)
                                .desired_width(ui.available_width() - 70.0)
                                .hint_text(chain.default_rpc),
                        );
                        if response.changed() {
                            self.apply_rpc();
                        }
                        let checking = self.rpc_check.job.is_some();
                        if ui
                            .add_enabled(!checking, egui::Button::new(if checking { "⏳" } else { "Check" }).small())
                            .on_hover_text("Query chain id and latest block")
                            .clicked()
                        {
                            self.start_rpc_check();
                        }
                    });
                    ui.end_row();

                    ui.label("");
                    self.render_rpc_check_result(ui);
                    ui.end_row();

                    ui.label("Interval (ms):");
                    ui.vertical(|ui| {
                        let response = ui.add_enabled(
                            !running,
                            egui::TextEdit::singleline(&mut self.form.interval).desired_width(100.0),
                        );
                        if response.changed() {
                            self.apply_interval();
                        }
                        if let Some(error) = &self.form.interval_error {
                            ui.label(RichText::new(error).small().color(self.theme.error));
                        }
                        ui.label(
                            RichText::new(send_rate_hint(self.session.accounts().len(), self.session.interval_ms()))
                                .small()
                                .color(self.theme.text_secondary),
                        );
                    });
                    ui.end_row();

                    ui.label("Inscription:");
                    ui.vertical(|ui| {
                        let response = ui.add_enabled(
                            !running,
                            egui::TextEdit::multiline(&mut self.form.payload)
                                .font(egui::TextStyle::Monospace)
                                .desired_rows(3)
                                .desired_width(f32::INFINITY)
                                .hint_text("data:,{\"p\":\"erc-20\",\"op\":\"mint\",\"tick\":\"...\",\"amt\":\"1000\"}"),
                        );
                        if response.changed() {
                            self.apply_payload();
                        }
                        let hex = self.session.payload_hex();
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(payload_size_label(self.session.payload()))
                                    .small()
                                    .color(self.theme.text_secondary),
                            );
                            ui.label(RichText::new(truncate_chars(&hex, 48)).small().monospace());
                            if ui.add(egui::Button::new("📋").small()).on_hover_text("Copy calldata hex").clicked() {
                                ui.output_mut(|o| o.copied_text = hex.clone());
                            }
                        });
                    });
                    ui.end_row();
                });
        });
    }

    fn render_rpc_check_result(&self, ui: &mut egui::Ui) {
        if self.rpc_check.job.is_some() {
            ui.label(RichText::new("Checking...").small().color(self.theme.warning));
            return;
        }
        match &self.rpc_check.result {
            Some(Ok(probe)) => {
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(format!(
                            "chain id {} · block #{} · {}ms",
                            probe.chain_id, probe.block_number, probe.latency_ms
                        ))
                        .small()
                        .color(self.theme.latency_color(probe.latency_ms)),
                    );
                    if let Some(chain) = self.rpc_check.chain {
                        if !probe.matches(chain) {
                            ui.label(
                                RichText::new(format!(
                                    "⚠ RPC serves chain {}, but {} is {}",
                                    probe.chain_id, chain.label, chain.chain_id
                                ))
                                .small()
                                .color(self.theme.warning),
                            );
                        }
                    }
                });
            }
            Some(Err(e)) => {
                ui.label(RichText::new(truncate_chars(e, 80)).small().color(self.theme.error));
            }
            None => {
                ui.label("");
            }
        }
    }

    fn render_run_controls(&mut self, ui: &mut egui::Ui) {
        let running = self.session.is_running();
        ui.horizontal(|ui| {
            if ui.add(self.theme.button_run(running)).clicked() {
                self.toggle_run();
            }
            ui.add_space(self.theme.spacing_md);
            ui.vertical(|ui| {
                if self.session.is_running() {
                    ui.label(
                        RichText::new(format!("Inscribing on {}", self.session.chain().label))
                            .strong()
                            .color(self.theme.success),
                    );
                    ui.label(
                        RichText::new(send_rate_hint(self.session.accounts().len(), self.session.interval_ms()))
                            .small()
                            .color(self.theme.text_secondary),
                    );
                } else if self.session.finishing_runs() > 0 {
                    ui.label(
                        RichText::new("Stopping: waiting for in-flight transactions")
                            .color(self.theme.warning),
                    );
                } else {
                    ui.label(RichText::new("Idle").color(self.theme.text_secondary));
                }
            });
        });
    }
}
