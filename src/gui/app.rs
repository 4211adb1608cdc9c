//! Main GUI application module
//!
//! Contains the GuiApp struct, its form state and the eframe entry point.

use crate::async_job::AsyncJob;
use crate::client::{probe_rpc, RpcProbe};
use crate::config::{Chain, CHAINS};
use crate::operation_log;
use crate::session::Session;
use crate::user_settings::UserSettings;
use anyhow::{anyhow, Result};
use eframe::{egui, egui::RichText, App, Frame, NativeOptions};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;

use super::helpers::{load_icon, truncate_chars};
use super::notifications::{push_notification, NotificationEntry};
use super::theme::{configure_style, AppTheme};

/// GUI section enum for navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiSection {
    Inscribe,
    Settings,
}

/// Text buffers bound to the inscribe form. Every edit is pushed into the
/// session right away; the session keeps the last accepted values.
pub(crate) struct FormState {
    pub(crate) keys: String,
    pub(crate) recipient: String,
    pub(crate) rpc: String,
    pub(crate) payload: String,
    pub(crate) interval: String,
    pub(crate) hide_keys: bool,
    pub(crate) recipient_error: Option<String>,
    pub(crate) interval_error: Option<String>,
}

impl FormState {
    fn from_session(session: &Session) -> Self {
        Self {
            keys: session.key_input().to_string(),
            recipient: session.recipient_input().to_string(),
            rpc: session.rpc_input().to_string(),
            payload: session.payload_input().to_string(),
            interval: session.interval_input().to_string(),
            hide_keys: true,
            recipient_error: None,
            interval_error: None,
        }
    }
}

pub(crate) struct RpcCheckState {
    pub(crate) job: Option<AsyncJob<RpcProbe>>,
    pub(crate) result: Option<Result<RpcProbe, String>>,
    /// Chain selected when the check was started
    pub(crate) chain: Option<&'static Chain>,
}

/// Pending (unsaved) values on the settings page
pub(crate) struct SettingsFormState {
    pub(crate) chain_key: String,
    pub(crate) rpc_chain_key: String,
    pub(crate) rpc: String,
    pub(crate) interval: String,
    pub(crate) max_in_flight_ticks: usize,
    pub(crate) error: Option<String>,
}

impl SettingsFormState {
    pub(crate) fn from_settings(settings: &UserSettings) -> Self {
        let chain_key = settings.selected_chain().key.to_string();
        Self {
            rpc: settings.get_custom_rpc(&chain_key).cloned().unwrap_or_default(),
            rpc_chain_key: chain_key.clone(),
            chain_key,
            interval: settings.default_interval_ms.to_string(),
            max_in_flight_ticks: settings.max_in_flight_ticks,
            error: None,
        }
    }
}

pub struct GuiApp {
    pub(crate) session: Session,
    pub(crate) user_settings: UserSettings,
    pub(crate) theme: AppTheme,
    pub(crate) section: GuiSection,
    pub(crate) form: FormState,
    pub(crate) rpc_check: RpcCheckState,
    pub(crate) settings_form: SettingsFormState,
    pub(crate) notifications: VecDeque<NotificationEntry>,
    pub(crate) show_notifications_popup: bool,
    pub(crate) notification_toast_close_time: Option<Instant>,
    pub(crate) last_notification_count: usize,
}

impl GuiApp {
    fn new(ctx: &egui::Context) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let user_settings = UserSettings::load();
        let session = Session::from_settings(&user_settings);
        let form = FormState::from_session(&session);
        let settings_form = SettingsFormState::from_settings(&user_settings);

        Self {
            session,
            user_settings,
            theme,
            section: GuiSection::Inscribe,
            form,
            rpc_check: RpcCheckState {
                job: None,
                result: None,
                chain: None,
            },
            settings_form,
            notifications: VecDeque::with_capacity(20),
            show_notifications_popup: false,
            notification_toast_close_time: None,
            last_notification_count: 0,
        }
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>) {
        push_notification(&mut self.notifications, message);
    }

    pub(crate) fn spawn_job<T, FutBuilder, Fut>(&self, builder: FutBuilder) -> AsyncJob<T>
    where
        T: Send + 'static,
        FutBuilder: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T>> + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(builder()),
                Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
        AsyncJob::new(rx)
    }

    // ----- form bindings -----

    pub(crate) fn select_chain(&mut self, chain: &'static Chain) {
        if let Err(e) = self.session.set_chain(chain) {
            self.notify(format!("[!!] {}", e));
            return;
        }
        // Swap in the saved RPC override for the new chain, if any
        self.form.rpc = self.user_settings.get_custom_rpc(chain.key).cloned().unwrap_or_default();
        self.apply_rpc();
        self.rpc_check.result = None;
        self.notify(format!("Switched to {}", chain.label));
    }

    pub(crate) fn apply_keys(&mut self) {
        if let Err(e) = self.session.set_key_input(&self.form.keys) {
            self.notify(format!("[!!] {}", e));
            self.form.keys = self.session.key_input().to_string();
        }
    }

    pub(crate) fn apply_recipient(&mut self) {
        self.form.recipient_error = self
            .session
            .set_recipient_input(&self.form.recipient)
            .err()
            .map(|e| e.to_string());
    }

    pub(crate) fn apply_rpc(&mut self) {
        if let Err(e) = self.session.set_rpc_input(&self.form.rpc) {
            self.notify(format!("[!!] {}", e));
            self.form.rpc = self.session.rpc_input().to_string();
        }
    }

    pub(crate) fn apply_payload(&mut self) {
        if let Err(e) = self.session.set_payload_input(&self.form.payload) {
            self.notify(format!("[!!] {}", e));
            self.form.payload = self.session.payload_input().to_string();
        }
    }

    pub(crate) fn apply_interval(&mut self) {
        self.form.interval_error = self
            .session
            .set_interval_input(&self.form.interval)
            .err()
            .map(|e| e.to_string());
    }

    pub(crate) fn load_keys_from_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                self.form.keys = content;
                self.apply_keys();
                let summary = self.session.parsed_accounts().summary();
                self.notify(format!("[OK] {} from {}", summary, path.display()));
            }
            Err(e) => {
                tracing::warn!("Failed to read key file {:?}: {}", path, e);
                self.notify(format!("[XX] Failed to read key file: {}", e));
            }
        }
    }

    // ----- run control -----

    pub(crate) fn toggle_run(&mut self) {
        if self.session.is_running() {
            self.session.stop();
            self.notify("Stopping: waiting for in-flight transactions");
            return;
        }

        let description = self.session.run_description();
        if self.session.start() {
            let chain_id = self.session.chain().chain_id;
            if let Err(e) = operation_log::append_log("Inscription run started", chain_id, &description) {
                tracing::warn!("Failed to write operation log: {}", e);
            }
            self.notify(format!("[OK] Inscribing on {}", self.session.chain().label));
        } else if let Some(record) = self.session.log().latest() {
            let message = format!("[!!] Not started: {}", record.detail());
            self.notify(message);
        }
    }

    pub(crate) fn start_rpc_check(&mut self) {
        let config = self.session.run_config();
        self.rpc_check.chain = Some(config.chain);
        self.rpc_check.result = None;
        self.rpc_check.job = Some(self.spawn_job(move || async move { probe_rpc(&config).await }));
    }

    pub(crate) fn export_log(&mut self) {
        let default_name = format!("inscriptions-{}.csv", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        else {
            return;
        };
        match self.session.export_csv(&path) {
            Ok(()) => self.notify(format!("[OK] Exported {} entries to {}", self.session.log().len(), path.display())),
            Err(e) => self.notify(format!("[XX] Export failed: {}", e)),
        }
    }

    pub(crate) fn clear_log(&mut self) {
        match self.session.clear_log() {
            Ok(()) => self.notify("Log cleared"),
            Err(e) => self.notify(format!("[!!] {}", e)),
        }
    }

    fn poll_jobs(&mut self) {
        let outcome = self.session.poll();
        for summary in outcome.finished {
            if let Err(e) = operation_log::append_log("Inscription run stopped", summary.chain_id, summary.summary()) {
                tracing::warn!("Failed to write operation log: {}", e);
            }
            self.notify(format!("Run finished. {}", summary.summary()));
        }

        if let Some(job) = &mut self.rpc_check.job {
            if let Some(result) = job.poll() {
                self.rpc_check.result = Some(result.map_err(|e| e.to_string()));
                self.rpc_check.job = None;
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.session.is_running() || self.session.finishing_runs() > 0 || self.rpc_check.job.is_some()
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(self.theme.spacing_sm);
            ui.horizontal_wrapped(|ui| {
                ui.heading(RichText::new("✒ Inscriber").strong().color(self.theme.primary));
                ui.label(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .size(12.0)
                        .color(self.theme.text_secondary),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let current = self.session.chain();
                    let mut picked: Option<&'static Chain> = None;
                    ui.add_enabled_ui(!self.session.is_running(), |ui| {
                        egui::ComboBox::from_id_source("chain_selector")
                            .selected_text(format!("{} ({})", current.label, current.native_token))
                            .width(200.0)
                            .show_ui(ui, |ui| {
                                ui.set_min_width(240.0);
                                for chain in CHAINS {
                                    let label = format!("{} · {} · #{}", chain.label, chain.native_token, chain.chain_id);
                                    if ui.selectable_label(chain.key == current.key, label).clicked() {
                                        picked = Some(chain);
                                    }
                                }
                            })
                            .response
                            .on_disabled_hover_text("Stop the run to switch chains");
                    });
                    if let Some(chain) = picked {
                        if chain.key != current.key {
                            self.select_chain(chain);
                        }
                    }

                    ui.add_space(self.theme.spacing_md);
                    let (icon, color, text) = if self.session.is_running() {
                        ("●", self.theme.success, "Running")
                    } else if self.session.finishing_runs() > 0 {
                        ("◐", self.theme.warning, "Stopping")
                    } else {
                        ("○", self.theme.text_secondary, "Idle")
                    };
                    ui.label(RichText::new(text).size(12.0).color(self.theme.text_secondary));
                    ui.label(RichText::new(icon).size(14.0).color(color));
                });
            });
            ui.add_space(self.theme.spacing_xs);
        });
    }

    fn render_notifications(&mut self, ctx: &egui::Context) {
        let count = self.notifications.len();
        if count > self.last_notification_count {
            self.notification_toast_close_time = Some(Instant::now() + Duration::from_secs(5));
        }
        self.last_notification_count = count;
        if let Some(close_time) = self.notification_toast_close_time {
            if Instant::now() >= close_time {
                self.notification_toast_close_time = None;
            }
        }
        let toast = self
            .notification_toast_close_time
            .and(self.notifications.back())
            .map(|n| truncate_chars(&n.message, 60));

        egui::Area::new(egui::Id::new("notification_overlay"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                self.theme.frame_panel().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let icon_color = if count > 0 { self.theme.primary } else { self.theme.text_secondary };
                        if ui
                            .add(
                                egui::Button::new(RichText::new("[!]").strong().color(icon_color))
                                    .fill(egui::Color32::TRANSPARENT)
                                    .stroke(egui::Stroke::NONE),
                            )
                            .on_hover_text("Notification history")
                            .clicked()
                        {
                            self.show_notifications_popup = !self.show_notifications_popup;
                        }
                        if let Some(message) = &toast {
                            ui.label(RichText::new(message).size(12.0));
                        } else if count > 0 {
                            ui.label(RichText::new(count.to_string()).size(10.0).color(self.theme.warning));
                        }
                    });
                });
            });

        if self.show_notifications_popup {
            let mut open = true;
            egui::Window::new("Notifications")
                .open(&mut open)
                .collapsible(false)
                .resizable(true)
                .default_width(420.0)
                .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -60.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("{} notifications", count)).color(self.theme.text_secondary));
                        if ui.add(self.theme.button_secondary("Clear")).clicked() {
                            self.notifications.clear();
                        }
                    });
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                        if self.notifications.is_empty() {
                            ui.label(RichText::new("No notifications yet.").color(self.theme.text_secondary));
                        }
                        for entry in self.notifications.iter().rev() {
                            ui.horizontal_wrapped(|ui| {
                                ui.label(
                                    RichText::new(format!("[{}]", entry.time_ago()))
                                        .size(11.0)
                                        .color(self.theme.text_secondary),
                                );
                                ui.label(RichText::new(&entry.message).size(12.0));
                            });
                        }
                    });
                });
            self.show_notifications_popup = open;
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();

        self.render_top_bar(ctx);
        self.render_notifications(ctx);

        egui::SidePanel::left("nav")
            .resizable(false)
            .default_width(150.0)
            .show(ctx, |ui| {
                ui.add_space(self.theme.spacing_md);
                let nav_items = [
                    (GuiSection::Inscribe, "[>] Inscribe"),
                    (GuiSection::Settings, "[*] Settings"),
                ];
                for (section, label) in nav_items {
                    let selected = self.section == section;
                    let color = if selected { self.theme.primary } else { self.theme.text_secondary };
                    if ui
                        .add(
                            egui::Button::new(RichText::new(label).size(14.0).color(color))
                                .fill(egui::Color32::TRANSPARENT)
                                .stroke(egui::Stroke::NONE),
                        )
                        .clicked()
                    {
                        self.section = section;
                    }
                    ui.add_space(self.theme.spacing_xs);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.section {
                GuiSection::Inscribe => self.view_inscribe(ui),
                GuiSection::Settings => self.view_settings(ui),
            });
        });

        let repaint = if self.is_busy() {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        };
        ctx.request_repaint_after(repaint);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(chain_id) = self.session.running_chain_id() {
            self.session.stop();
            if let Err(e) = operation_log::append_log("Inscription run stopped", chain_id, "Application closed") {
                tracing::warn!("Failed to write operation log: {}", e);
            }
        }
    }
}

pub fn launch() -> Result<()> {
    let app_creator = move |cc: &eframe::CreationContext<'_>| Box::new(GuiApp::new(&cc.egui_ctx)) as Box<dyn App>;

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([1100.0, 760.0])
        .with_min_inner_size([760.0, 520.0]);
    if let Some(icon) = load_icon() {
        viewport = viewport.with_icon(std::sync::Arc::new(icon));
    }

    let native_options = NativeOptions {
        viewport,
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native("Inscriber", native_options, Box::new(app_creator))
        .map_err(|e| anyhow!("Failed to start GUI: {}", e))
}
