//! Inscriber library: account parsing, the timed submission loop and the
//! session controller behind the desktop GUI.

pub mod accounts;
pub mod async_job;
pub mod client;
pub mod config;
pub mod gui;
pub mod log_store;
pub mod operation_log;
pub mod session;
pub mod submission;
pub mod user_settings;
pub mod utils;
