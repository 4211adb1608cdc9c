//! In-memory run log.
//!
//! Records are kept newest first. Nothing is ever evicted; only the rendered
//! view is capped at [`DISPLAY_LIMIT`].

use crate::config::get_tx_explorer_url;
use crate::utils::{checksum, shorten_address};
use anyhow::Result;
use chrono::{DateTime, Local};
use ethers::types::{Address, TxHash};
use serde::Serialize;
use std::collections::VecDeque;
use std::io::Write;

/// Maximum number of records rendered at once
pub const DISPLAY_LIMIT: usize = 200;

/// Outcome of one submission (or one rejected start).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LogRecord {
    Success {
        timestamp: DateTime<Local>,
        /// Chain the transaction was sent on
        chain_id: u64,
        tx_hash: TxHash,
        from: Address,
        to: Address,
    },
    Failure {
        timestamp: DateTime<Local>,
        message: String,
    },
}

impl LogRecord {
    pub fn success(chain_id: u64, tx_hash: TxHash, from: Address, to: Address) -> Self {
        LogRecord::Success {
            timestamp: Local::now(),
            chain_id,
            tx_hash,
            from,
            to,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        LogRecord::Failure {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Failure attributed to one sender: `"0xABCD...WXYZ <error>"`
    pub fn submission_failure(from: Address, error: impl std::fmt::Display) -> Self {
        Self::failure(format!("{} {}", shorten_address(&from), error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LogRecord::Success { .. })
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            LogRecord::Success { timestamp, .. } | LogRecord::Failure { timestamp, .. } => *timestamp,
        }
    }

    /// Explorer link for a success, on the chain it was sent to
    pub fn explorer_url(&self) -> Option<String> {
        match self {
            LogRecord::Success { chain_id, tx_hash, .. } => {
                get_tx_explorer_url(*chain_id, &format!("{:?}", tx_hash))
            }
            LogRecord::Failure { .. } => None,
        }
    }

    pub fn status_icon(&self) -> &'static str {
        if self.is_success() {
            "✅"
        } else {
            "❌"
        }
    }

    /// Body of the log line without timestamp and icon
    pub fn detail(&self) -> String {
        match self {
            LogRecord::Success { tx_hash, from, .. } => {
                format!("{} {:?}", shorten_address(from), tx_hash)
            }
            LogRecord::Failure { message, .. } => message.clone(),
        }
    }

    /// One-line rendering: `2024-01-01 12:00:00 ✅ => 0xf39F...2266 0xabc...`
    pub fn render_line(&self) -> String {
        format!(
            "{} {} => {}",
            self.timestamp().format("%Y-%m-%d %H:%M:%S"),
            self.status_icon(),
            self.detail()
        )
    }
}

/// Flat row used for CSV export
#[derive(Serialize)]
struct CsvRow {
    status: &'static str,
    timestamp: String,
    chain_id: String,
    tx_hash: String,
    from: String,
    to: String,
    message: String,
}

impl From<&LogRecord> for CsvRow {
    fn from(record: &LogRecord) -> Self {
        match record {
            LogRecord::Success {
                timestamp,
                chain_id,
                tx_hash,
                from,
                to,
            } => CsvRow {
                status: "success",
                timestamp: timestamp.to_rfc3339(),
                chain_id: chain_id.to_string(),
                tx_hash: format!("{:?}", tx_hash),
                from: checksum(from),
                to: checksum(to),
                message: String::new(),
            },
            LogRecord::Failure { timestamp, message } => CsvRow {
                status: "failure",
                timestamp: timestamp.to_rfc3339(),
                chain_id: String::new(),
                tx_hash: String::new(),
                from: String::new(),
                to: String::new(),
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogStore {
    records: VecDeque<LogRecord>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record as the newest entry
    pub fn push(&mut self, record: LogRecord) {
        self.records.push_front(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Newest record, if any
    pub fn latest(&self) -> Option<&LogRecord> {
        self.records.front()
    }

    /// Every record, newest first
    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    /// The records to render, newest first, at most [`DISPLAY_LIMIT`]
    pub fn visible(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter().take(DISPLAY_LIMIT)
    }

    pub fn visible_len(&self) -> usize {
        self.records.len().min(DISPLAY_LIMIT)
    }

    /// Success count over the full log, not just the visible slice
    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.records.len() - self.success_count()
    }

    /// Write every record as CSV (newest first)
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(CsvRow::from(record))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn success(n: u8) -> LogRecord {
        LogRecord::success(56, TxHash::repeat_byte(n), addr(n), addr(0xee))
    }

    #[test]
    fn test_push_prepends() {
        let mut store = LogStore::new();
        store.push(LogRecord::failure("first"));
        store.push(LogRecord::failure("second"));
        let messages: Vec<String> = store.iter().map(|r| r.detail()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(store.latest().unwrap().detail(), "second");
    }

    #[test]
    fn test_visible_is_capped_but_store_is_not() {
        let mut store = LogStore::new();
        for i in 0..250u32 {
            store.push(success((i % 200) as u8));
        }
        assert_eq!(store.len(), 250);
        assert_eq!(store.visible().count(), DISPLAY_LIMIT);
        assert_eq!(store.visible_len(), DISPLAY_LIMIT);
    }

    #[test]
    fn test_success_count_covers_full_log() {
        let mut store = LogStore::new();
        // 150 old successes, then 200 newer failures fill the visible window
        for i in 0..150u8 {
            store.push(success(i));
        }
        for _ in 0..200 {
            store.push(LogRecord::failure("boom"));
        }
        assert!(store.visible().all(|r| !r.is_success()));
        assert_eq!(store.success_count(), 150);
        assert_eq!(store.failure_count(), 200);
    }

    #[test]
    fn test_submission_failure_message() {
        let from: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        let record = LogRecord::submission_failure(from, "insufficient funds");
        assert_eq!(record.detail(), "0xf39F...2266 insufficient funds");
        assert!(!record.is_success());
    }

    #[test]
    fn test_render_line() {
        let record = success(0xab);
        let line = record.render_line();
        assert!(line.contains("✅ => "));
        assert!(line.contains(&shorten_address(&addr(0xab))));
        assert!(line.contains(&format!("{:?}", TxHash::repeat_byte(0xab))));

        let failure = LogRecord::failure("no inscription payload");
        assert!(failure.render_line().ends_with("❌ => no inscription payload"));
    }

    #[test]
    fn test_serialize_has_status_tag() {
        let json = serde_json::to_value(success(1)).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("tx_hash").is_some());
        assert_eq!(json["chain_id"], 56);

        let json = serde_json::to_value(LogRecord::failure("x")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn test_write_csv() {
        let mut store = LogStore::new();
        store.push(success(1));
        store.push(LogRecord::failure("rpc down"));

        let mut out = Vec::new();
        store.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "status,timestamp,chain_id,tx_hash,from,to,message");
        assert!(lines[1].starts_with("failure,"));
        assert!(lines[1].ends_with(",,,,,rpc down"));
        assert!(lines[2].starts_with("success,"));
        assert!(lines[2].contains(",56,"));
        assert!(lines[2].contains(&format!("{:?}", TxHash::repeat_byte(1))));
    }

    #[test]
    fn test_explorer_url_uses_record_chain() {
        let record = success(0x11);
        let url = record.explorer_url().unwrap();
        assert_eq!(url, format!("https://bscscan.com/tx/{:?}", TxHash::repeat_byte(0x11)));

        let on_eth = LogRecord::success(1, TxHash::repeat_byte(0x11), addr(1), addr(1));
        assert!(on_eth.explorer_url().unwrap().starts_with("https://etherscan.io/tx/"));

        assert!(LogRecord::failure("x").explorer_url().is_none());
        assert!(LogRecord::success(999_999, TxHash::zero(), addr(1), addr(1)).explorer_url().is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = LogStore::new();
        store.push(success(1));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.success_count(), 0);
    }
}
