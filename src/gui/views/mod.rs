//! View modules for the GUI
//!
//! Each submodule adds rendering methods to `GuiApp`; `App::update` in
//! `app.rs` dispatches to them by section.
//!
//! - `inscribe` - accounts, transaction parameters and start/stop
//! - `log_panel` - run log table, success counter, export and clear
//! - `settings` - persisted defaults and file locations

pub mod inscribe;
pub mod log_panel;
pub mod settings;
