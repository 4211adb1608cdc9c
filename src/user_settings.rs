use crate::config::{self, Chain};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "inscriber_settings.json";

fn default_chain_key() -> String {
    config::default_chain().key.to_string()
}

fn default_interval_ms() -> u64 {
    config::default_interval_ms()
}

fn default_max_in_flight_ticks() -> usize {
    1
}

/// User preferences that persist between sessions.
///
/// Keys, mnemonics and the inscription payload are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    /// Short key of the chain selected on startup
    #[serde(default = "default_chain_key")]
    pub selected_chain: String,
    /// Custom RPC overrides per chain key
    #[serde(default)]
    pub custom_rpcs: HashMap<String, String>,
    /// Tick interval pre-filled into the form (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,
    /// How many ticks may be in flight at once
    #[serde(default = "default_max_in_flight_ticks")]
    pub max_in_flight_ticks: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_chain: default_chain_key(),
            custom_rpcs: HashMap::new(),
            default_interval_ms: default_interval_ms(),
            max_in_flight_ticks: default_max_in_flight_ticks(),
        }
    }
}

impl UserSettings {
    /// Get the settings file path
    fn settings_path() -> PathBuf {
        crate::operation_log::app_data_dir().join(SETTINGS_FILE)
    }

    /// Get the settings file path for display
    pub fn settings_path_display() -> String {
        Self::settings_path().display().to_string()
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<UserSettings>(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings.sanitized();
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Replace values a hand-edited file could have broken
    fn sanitized(mut self) -> Self {
        if config::find_chain_by_key(&self.selected_chain).is_none() {
            tracing::warn!("Unknown chain '{}' in settings, using default", self.selected_chain);
            self.selected_chain = default_chain_key();
        }
        if self.default_interval_ms == 0 {
            self.default_interval_ms = config::DEFAULT_INTERVAL_MS;
        }
        self.max_in_flight_ticks = config::clamp_in_flight_ticks(self.max_in_flight_ticks);
        self
    }

    /// The chain selected on startup
    pub fn selected_chain(&self) -> &'static Chain {
        config::find_chain_by_key(&self.selected_chain).unwrap_or_else(config::default_chain)
    }

    /// Get custom RPC for a chain, or None if using default
    pub fn get_custom_rpc(&self, chain_key: &str) -> Option<&String> {
        self.custom_rpcs.get(chain_key).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a chain (empty string removes the override)
    pub fn set_custom_rpc(&mut self, chain_key: &str, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(chain_key);
        } else {
            self.custom_rpcs.insert(chain_key.to_string(), rpc.trim().to_string());
        }
    }
}
