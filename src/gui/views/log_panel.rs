//! Run log panel
//!
//! Shows the most recent entries newest first, the success counter and the
//! export/clear actions.

use crate::config::find_chain_by_chain_id;
use crate::gui::app::GuiApp;
use crate::log_store::{LogRecord, DISPLAY_LIMIT};
use crate::utils::{checksum, shorten_address, shorten_hex};
use eframe::egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

const ROW_HEIGHT: f32 = 22.0;

impl GuiApp {
    pub(crate) fn view_log_panel(&mut self, ui: &mut egui::Ui) {
        let running = self.session.is_running();
        let mut export_clicked = false;
        let mut clear_clicked = false;

        self.theme.frame_panel().show(ui, |ui| {
            let log = self.session.log();
            ui.horizontal(|ui| {
                ui.label(RichText::new("[L] Log").size(16.0).strong());
                ui.add_space(self.theme.spacing_md);
                ui.label(
                    RichText::new(format!("✅ Success: {}", log.success_count()))
                        .strong()
                        .color(self.theme.success),
                );
                ui.label(RichText::new(format!("❌ Failed: {}", log.failure_count())).color(self.theme.error));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!running && !log.is_empty(), self.theme.button_secondary("Clear"))
                        .on_disabled_hover_text("Available when idle with a non-empty log")
                        .clicked()
                    {
                        clear_clicked = true;
                    }
                    if ui
                        .add_enabled(!log.is_empty(), self.theme.button_secondary("Export CSV"))
                        .clicked()
                    {
                        export_clicked = true;
                    }
                });
            });

            if log.len() > DISPLAY_LIMIT {
                ui.label(
                    RichText::new(format!("Showing the latest {} of {} entries", DISPLAY_LIMIT, log.len()))
                        .small()
                        .color(self.theme.text_secondary),
                );
            }
            ui.add_space(self.theme.spacing_xs);

            if log.is_empty() {
                ui.label(RichText::new("No transactions yet. Press Start to begin.").color(self.theme.text_secondary));
                return;
            }

            let rows: Vec<&LogRecord> = log.visible().collect();
            let theme = self.theme;

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(140.0))
                .column(Column::auto().at_least(40.0))
                .column(Column::remainder().at_least(200.0).clip(true))
                .column(Column::exact(64.0))
                .max_scroll_height(360.0)
                .header(ROW_HEIGHT, |mut header| {
                    header.col(|ui| {
                        ui.strong("Time");
                    });
                    header.col(|ui| {
                        ui.strong("Status");
                    });
                    header.col(|ui| {
                        ui.strong("Details");
                    });
                    header.col(|ui| {
                        ui.strong("");
                    });
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                        let record = rows[row.index()];
                        row.col(|ui| {
                            ui.label(
                                RichText::new(record.timestamp().format("%Y-%m-%d %H:%M:%S").to_string())
                                    .color(theme.text_secondary),
                            );
                        });
                        row.col(|ui| {
                            ui.label(RichText::new(record.status_icon()).color(theme.status_color(record.is_success())));
                        });
                        row.col(|ui| match record {
                            LogRecord::Success { chain_id, tx_hash, from, to, .. } => {
                                let chain_label = find_chain_by_chain_id(*chain_id).map(|c| c.label).unwrap_or("unknown chain");
                                ui.monospace(format!(
                                    "{} → {}  {}",
                                    shorten_address(from),
                                    shorten_address(to),
                                    shorten_hex(&format!("{:?}", tx_hash))
                                ))
                                .on_hover_text(format!(
                                    "{:?}\non {}\nfrom {}\nto {}",
                                    tx_hash,
                                    chain_label,
                                    checksum(from),
                                    checksum(to)
                                ));
                            }
                            LogRecord::Failure { message, .. } => {
                                ui.label(RichText::new(message).color(theme.error)).on_hover_text(message);
                            }
                        });
                        row.col(|ui| {
                            if let LogRecord::Success { tx_hash, .. } = record {
                                let hash = format!("{:?}", tx_hash);
                                if ui.add(egui::Button::new("📋").small()).on_hover_text("Copy transaction hash").clicked() {
                                    ui.output_mut(|o| o.copied_text = hash.clone());
                                }
                                if let Some(url) = record.explorer_url() {
                                    if ui.add(egui::Button::new("🔗").small()).on_hover_text("View on block explorer").clicked() {
                                        if let Err(e) = open::that(&url) {
                                            tracing::warn!("Failed to open explorer URL: {}", e);
                                        }
                                    }
                                }
                            }
                        });
                    });
                });
        });

        if export_clicked {
            self.export_log();
        }
        if clear_clicked {
            self.clear_log();
        }
    }
}
