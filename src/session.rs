//! Session controller.
//!
//! Owns everything the form edits (chain, keys, recipient, RPC, payload,
//! interval), the run log and the run state. The GUI binds its widgets to a
//! `Session` and calls [`Session::poll`] once per frame.

use crate::accounts::{parse_accounts, Account, ParsedAccounts};
use crate::client::{ClientError, EthersClient, InscriptionClient};
use crate::config::{self, clamp_in_flight_ticks, Chain, RunConfig};
use crate::log_store::{LogRecord, LogStore};
use crate::submission::{RunHandle, RunSummary, SubmissionLoop};
use crate::user_settings::UserSettings;
use crate::utils::{checksum, inscription_hex, parse_address, parse_interval_ms, InputError};
use anyhow::Result;
use ethers::types::Address;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const NO_ACCOUNTS_MESSAGE: &str = "no private keys or mnemonics provided";
pub const NO_PAYLOAD_MESSAGE: &str = "no inscription payload";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("parameters cannot change while a run is active")]
    Running,
    #[error(transparent)]
    Input(#[from] InputError),
}

/// What changed during one [`Session::poll`]
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Records moved into the log
    pub records: usize,
    /// Runs that fully finished (stopped and drained)
    pub finished: Vec<RunSummary>,
}

pub struct Session {
    chain: &'static Chain,
    key_input: String,
    parsed: ParsedAccounts,
    recipient_input: String,
    recipient: Option<Address>,
    rpc_input: String,
    payload_input: String,
    interval_input: String,
    interval_ms: u64,
    max_in_flight_ticks: usize,
    log: LogStore,
    /// Present exactly while running
    active: Option<RunHandle>,
    /// Stopped runs whose in-flight ticks may still report
    finishing: Vec<RunHandle>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(config::default_chain(), config::default_interval_ms())
    }
}

impl Session {
    pub fn new(chain: &'static Chain, interval_ms: u64) -> Self {
        let interval_ms = interval_ms.max(1);
        Self {
            chain,
            key_input: String::new(),
            parsed: ParsedAccounts::default(),
            recipient_input: String::new(),
            recipient: None,
            rpc_input: String::new(),
            payload_input: String::new(),
            interval_input: interval_ms.to_string(),
            interval_ms,
            max_in_flight_ticks: 1,
            log: LogStore::new(),
            active: None,
            finishing: Vec::new(),
        }
    }

    /// Session pre-filled from saved preferences: chain, interval, overlap cap
    /// and that chain's custom RPC.
    pub fn from_settings(settings: &UserSettings) -> Self {
        let chain = settings.selected_chain();
        let mut session = Self::new(chain, settings.default_interval_ms);
        session.max_in_flight_ticks = clamp_in_flight_ticks(settings.max_in_flight_ticks);
        session.rpc_input = settings.get_custom_rpc(chain.key).cloned().unwrap_or_default();
        session
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_running() {
            Err(SessionError::Running)
        } else {
            Ok(())
        }
    }

    // ----- state accessors -----

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Chain id of the active run, if one is running
    pub fn running_chain_id(&self) -> Option<u64> {
        self.active.as_ref().map(|run| run.chain_id())
    }

    /// Stopped runs still waiting on in-flight submissions
    pub fn finishing_runs(&self) -> usize {
        self.finishing.len()
    }

    pub fn chain(&self) -> &'static Chain {
        self.chain
    }

    pub fn accounts(&self) -> &[Account] {
        &self.parsed.accounts
    }

    pub fn parsed_accounts(&self) -> &ParsedAccounts {
        &self.parsed
    }

    pub fn key_input(&self) -> &str {
        &self.key_input
    }

    pub fn recipient(&self) -> Option<Address> {
        self.recipient
    }

    pub fn recipient_input(&self) -> &str {
        &self.recipient_input
    }

    pub fn rpc_input(&self) -> &str {
        &self.rpc_input
    }

    pub fn payload_input(&self) -> &str {
        &self.payload_input
    }

    /// The inscription that will be sent: the payload input, trimmed
    pub fn payload(&self) -> &str {
        self.payload_input.trim()
    }

    /// Hex calldata preview of the current payload
    pub fn payload_hex(&self) -> String {
        inscription_hex(self.payload())
    }

    pub fn interval_input(&self) -> &str {
        &self.interval_input
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn max_in_flight_ticks(&self) -> usize {
        self.max_in_flight_ticks
    }

    pub fn log(&self) -> &LogStore {
        &self.log
    }

    /// The configuration a run started now would use
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.chain, Some(self.rpc_input.as_str()), self.interval_ms)
            .with_max_in_flight_ticks(self.max_in_flight_ticks)
    }

    /// Multi-line description of the run the current form would start.
    /// Secrets never appear in it.
    pub fn run_description(&self) -> String {
        let config = self.run_config();
        let recipient = match self.recipient {
            Some(address) => checksum(&address),
            None => "each sender (self)".to_string(),
        };
        format!(
            "Chain: {} ({})\nRPC: {}\nAccounts: {}\nRecipient: {}\nInterval: {}ms\nMax in-flight ticks: {}\nPayload: {} bytes",
            config.chain.label,
            config.chain.chain_id,
            config.rpc_url,
            self.parsed.accounts.len(),
            recipient,
            self.interval_ms,
            config.max_in_flight_ticks,
            self.payload().len()
        )
    }

    // ----- form bindings -----

    pub fn set_chain(&mut self, chain: &'static Chain) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.chain = chain;
        Ok(())
    }

    /// Replace the key input and re-parse the account list wholesale
    pub fn set_key_input(&mut self, text: &str) -> Result<&ParsedAccounts, SessionError> {
        self.ensure_idle()?;
        self.key_input = text.to_string();
        self.parsed = parse_accounts(text);
        Ok(&self.parsed)
    }

    /// Update the recipient. Empty input clears it (transactions go back to
    /// their sender); malformed input is kept as text but the previously
    /// accepted address stays in effect.
    pub fn set_recipient_input(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.recipient_input = text.to_string();
        if text.trim().is_empty() {
            self.recipient = None;
            return Ok(());
        }
        self.recipient = Some(parse_address(text)?);
        Ok(())
    }

    pub fn set_rpc_input(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.rpc_input = text.to_string();
        Ok(())
    }

    pub fn set_payload_input(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.payload_input = text.to_string();
        Ok(())
    }

    /// Update the interval. Invalid input is kept as text but the previous
    /// interval stays in effect.
    pub fn set_interval_input(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.interval_input = text.to_string();
        self.interval_ms = parse_interval_ms(text)?;
        Ok(())
    }

    pub fn set_max_in_flight_ticks(&mut self, max: usize) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.max_in_flight_ticks = clamp_in_flight_ticks(max);
        Ok(())
    }

    // ----- run control -----

    /// Start a run against the configured chain and RPC with the ethers client.
    pub fn start(&mut self) -> bool {
        self.start_with(|config| {
            EthersClient::connect(config).map(|c| Arc::new(c) as Arc<dyn InscriptionClient>)
        })
    }

    /// Start a run with a caller-supplied client. The connector is only called
    /// once the preconditions hold. Returns whether a run was started; every
    /// refusal is recorded as exactly one failure entry.
    pub fn start_with<F>(&mut self, connect: F) -> bool
    where
        F: FnOnce(&RunConfig) -> Result<Arc<dyn InscriptionClient>, ClientError>,
    {
        if self.is_running() {
            return true;
        }
        if self.parsed.accounts.is_empty() {
            warn!("Refusing to start: {}", NO_ACCOUNTS_MESSAGE);
            self.log.push(LogRecord::failure(NO_ACCOUNTS_MESSAGE));
            return false;
        }
        if self.payload().is_empty() {
            warn!("Refusing to start: {}", NO_PAYLOAD_MESSAGE);
            self.log.push(LogRecord::failure(NO_PAYLOAD_MESSAGE));
            return false;
        }

        let config = self.run_config();
        let client = match connect(&config) {
            Ok(client) => client,
            Err(e) => {
                warn!("Refusing to start: {}", e);
                self.log.push(LogRecord::failure(format!("cannot start: {}", e)));
                return false;
            }
        };

        info!(
            "Starting inscription run on {} with {} account(s) every {}ms",
            config.chain.label,
            self.parsed.accounts.len(),
            self.interval_ms
        );
        let submission = SubmissionLoop::new(
            client,
            self.parsed.accounts.clone(),
            self.recipient,
            self.payload(),
            &config,
        );
        self.active = Some(submission.spawn());
        true
    }

    /// Stop firing ticks. Submissions already in flight still complete and
    /// their records still arrive through [`Session::poll`].
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.request_stop();
            info!("Inscription run stop requested");
            self.finishing.push(handle);
        }
    }

    /// Start if idle, stop if running. Returns the new running state.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    /// Drain finished submissions into the log and retire fully stopped runs
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        let log = &mut self.log;

        if let Some(handle) = self.active.as_mut() {
            outcome.records += handle.drain_records(|r| log.push(r));
        }

        let mut still_finishing = Vec::with_capacity(self.finishing.len());
        for mut handle in self.finishing.drain(..) {
            outcome.records += handle.drain_records(|r| log.push(r));
            match handle.poll_summary() {
                Some(Ok(summary)) => {
                    // Every tick has reported by now; pick up the last records
                    outcome.records += handle.drain_records(|r| log.push(r));
                    outcome.finished.push(summary);
                }
                Some(Err(e)) => {
                    warn!("Inscription run ended abnormally: {}", e);
                    outcome.records += handle.drain_records(|r| log.push(r));
                }
                None => still_finishing.push(handle),
            }
        }
        self.finishing = still_finishing;
        outcome
    }

    /// Drop every log record. Only allowed while idle.
    pub fn clear_log(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.log.clear();
        Ok(())
    }

    /// Write the full log as CSV
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.log.write_csv(file)
    }
}
