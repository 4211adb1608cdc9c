//! GUI module for the Inscriber application
//!
//! This module provides the graphical user interface built with egui/eframe.
//!
//! ## Module Structure
//!
//! - `app` - Main GuiApp struct, form state and the eframe entry point
//! - `theme` - Colors, spacing and styled widget factories (AppTheme)
//! - `helpers` - Form hints and the window icon
//! - `notifications` - Notification history
//! - `views` - View rendering (inscribe, log panel, settings)
//!
//! ## Usage
//!
//! ```no_run
//! use inscriber::gui;
//!
//! gui::launch().expect("Failed to launch GUI");
//! ```
//!
//! The GUI thread never blocks on the network: runs and RPC checks execute on
//! background runtimes and are polled once per frame.

mod app;
pub mod helpers;
pub mod notifications;
pub mod theme;
pub mod views;

pub use app::{launch, GuiApp, GuiSection};
pub use helpers::load_icon;
pub use notifications::NotificationEntry;
pub use theme::{configure_style, AppTheme};
