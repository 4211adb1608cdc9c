//! The periodic submission loop.
//!
//! Every tick sends one transaction per account, one after another. Ticks may
//! overlap only up to `max_in_flight_ticks`; a tick that fires while the cap is
//! reached is skipped, not queued. Stopping prevents new ticks but lets the
//! ticks already in flight finish and report.

use crate::accounts::Account;
use crate::async_job::AsyncJob;
use crate::client::{InscriptionClient, InscriptionRequest};
use crate::config::{clamp_in_flight_ticks, RunConfig};
use crate::log_store::LogRecord;
use crate::utils::inscription_bytes;
use anyhow::anyhow;
use ethers::types::{Address, Bytes};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Semaphore};
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Chain the run sent to
    pub chain_id: u64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Ticks: {} (skipped {}) | Submitted: {} | Success: {} | Failed: {}",
            self.ticks, self.skipped_ticks, self.submitted, self.succeeded, self.failed
        )
    }
}

#[derive(Default)]
struct RunStats {
    ticks: AtomicU64,
    skipped_ticks: AtomicU64,
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl RunStats {
    fn snapshot(&self, chain_id: u64) -> RunSummary {
        RunSummary {
            chain_id,
            ticks: self.ticks.load(Ordering::SeqCst),
            skipped_ticks: self.skipped_ticks.load(Ordering::SeqCst),
            submitted: self.submitted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Shared by every tick of one run. The account list is a snapshot taken when
/// the loop is built.
struct TickContext {
    chain_id: u64,
    client: Arc<dyn InscriptionClient>,
    accounts: Vec<Account>,
    recipient: Option<Address>,
    payload: Bytes,
    stats: RunStats,
}

pub struct SubmissionLoop {
    ctx: Arc<TickContext>,
    interval: Duration,
    max_in_flight_ticks: usize,
}

impl SubmissionLoop {
    pub fn new(
        client: Arc<dyn InscriptionClient>,
        accounts: Vec<Account>,
        recipient: Option<Address>,
        payload: &str,
        config: &RunConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                chain_id: config.chain_id(),
                client,
                accounts,
                recipient,
                payload: inscription_bytes(payload),
                stats: RunStats::default(),
            }),
            interval: config.interval.max(Duration::from_millis(1)),
            max_in_flight_ticks: clamp_in_flight_ticks(config.max_in_flight_ticks),
        }
    }

    /// Run until `stop` fires (or its sender is dropped), then wait for the
    /// ticks still in flight. The first tick fires one interval after start.
    pub async fn run(
        self,
        mut stop: oneshot::Receiver<()>,
        records: UnboundedSender<LogRecord>,
    ) -> RunSummary {
        let permits = Arc::new(Semaphore::new(self.max_in_flight_ticks));
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        info!(
            "Submission loop started: {} account(s), interval {}ms, max {} tick(s) in flight",
            self.ctx.accounts.len(),
            self.interval.as_millis(),
            self.max_in_flight_ticks
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    let tick = self.ctx.stats.ticks.fetch_add(1, Ordering::SeqCst) + 1;
                    match permits.clone().try_acquire_owned() {
                        Ok(permit) => {
                            let ctx = self.ctx.clone();
                            let records = records.clone();
                            tokio::spawn(async move {
                                run_tick(&ctx, &records).await;
                                drop(permit);
                            });
                        }
                        Err(_) => {
                            self.ctx.stats.skipped_ticks.fetch_add(1, Ordering::SeqCst);
                            warn!("Tick {} skipped: previous tick(s) still in flight", tick);
                        }
                    }
                }
            }
        }

        // In-flight ticks are not cancelled; wait for them so their records land.
        match u32::try_from(self.max_in_flight_ticks) {
            Ok(all) => {
                let _ = permits.acquire_many(all).await;
            }
            Err(_) => warn!("Overlap cap {} out of range, not waiting for in-flight ticks", self.max_in_flight_ticks),
        }

        let summary = self.ctx.stats.snapshot(self.ctx.chain_id);
        info!("Submission loop stopped. {}", summary.summary());
        summary
    }

    /// Start the loop in the background and return its handle.
    ///
    /// Inside a tokio runtime the loop is spawned on it; otherwise (the GUI
    /// thread) it gets a dedicated thread with a current-thread runtime.
    pub fn spawn(self) -> RunHandle {
        let chain_id = self.ctx.chain_id;
        let (stop_tx, stop_rx) = oneshot::channel();
        let (record_tx, record_rx) = unbounded_channel();
        let (done_tx, summary) = AsyncJob::channel();

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = self.run(stop_rx, record_tx).await;
                    let _ = done_tx.send(Ok(result));
                });
            }
            Err(_) => {
                thread::spawn(move || {
                    let result = match Builder::new_current_thread().enable_all().build() {
                        Ok(runtime) => Ok(runtime.block_on(self.run(stop_rx, record_tx))),
                        Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
                    };
                    let _ = done_tx.send(result);
                });
            }
        }

        RunHandle {
            chain_id,
            stop: Some(stop_tx),
            records: record_rx,
            summary,
        }
    }
}

async fn run_tick(ctx: &TickContext, records: &UnboundedSender<LogRecord>) {
    for account in &ctx.accounts {
        let from = account.address();
        let to = ctx.recipient.unwrap_or(from);
        let request = InscriptionRequest {
            account,
            to,
            data: ctx.payload.clone(),
        };

        ctx.stats.submitted.fetch_add(1, Ordering::SeqCst);
        let record = match ctx.client.send_inscription(request).await {
            Ok(tx_hash) => {
                ctx.stats.succeeded.fetch_add(1, Ordering::SeqCst);
                info!("Inscription sent from {:?}: {:?}", from, tx_hash);
                LogRecord::success(ctx.chain_id, tx_hash, from, to)
            }
            Err(e) => {
                ctx.stats.failed.fetch_add(1, Ordering::SeqCst);
                warn!("Inscription from {:?} failed: {}", from, e);
                LogRecord::submission_failure(from, &e)
            }
        };
        // The receiver is gone only when the session was dropped
        let _ = records.send(record);
    }
}

/// Handle to a running (or finishing) loop
pub struct RunHandle {
    chain_id: u64,
    stop: Option<oneshot::Sender<()>>,
    records: UnboundedReceiver<LogRecord>,
    summary: AsyncJob<RunSummary>,
}

impl RunHandle {
    /// Chain this run sends to
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Ask the loop to stop firing ticks. Idempotent.
    pub fn request_stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_none()
    }

    /// Move every record produced so far into `sink`, returning how many
    pub fn drain_records(&mut self, mut sink: impl FnMut(LogRecord)) -> usize {
        let mut n = 0;
        while let Ok(record) = self.records.try_recv() {
            sink(record);
            n += 1;
        }
        n
    }

    /// The run summary once the loop has fully exited
    pub fn poll_summary(&mut self) -> Option<anyhow::Result<RunSummary>> {
        self.summary.poll()
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::tests::three_accounts;
    use crate::client::tests::MockClient;
    use crate::config::default_chain;
    use crate::utils::shorten_address;

    fn run_config(interval_ms: u64, max_in_flight: usize) -> RunConfig {
        RunConfig::new(default_chain(), None, interval_ms).with_max_in_flight_ticks(max_in_flight)
    }

    fn collect(handle: &mut RunHandle) -> Vec<LogRecord> {
        let mut out = Vec::new();
        handle.drain_records(|r| out.push(r));
        out
    }

    async fn finish(handle: &mut RunHandle) -> RunSummary {
        handle.request_stop();
        loop {
            if let Some(res) = handle.poll_summary() {
                return res.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_success_per_account_per_tick() {
        let client = Arc::new(MockClient::accepting());
        let accounts = three_accounts();
        let expected: Vec<Address> = accounts.iter().map(|a| a.address()).collect();
        let lp = SubmissionLoop::new(client.clone(), accounts, None, "data:,hi", &run_config(1000, 1));
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let records = collect(&mut handle);

        assert!(records.len() >= 6);
        assert!(records.iter().all(|r| r.is_success()));
        // records arrive in submission order: accounts cycle in input order
        for (i, record) in records.iter().enumerate() {
            match record {
                LogRecord::Success { chain_id, from, to, .. } => {
                    assert_eq!(*chain_id, 1);
                    assert_eq!(*from, expected[i % 3]);
                    assert_eq!(to, from, "recipient defaults to the sender");
                }
                LogRecord::Failure { .. } => unreachable!(),
            }
        }

        let summary = finish(&mut handle).await;
        assert_eq!(summary.chain_id, 1);
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.succeeded, 6);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let client = Arc::new(MockClient::accepting());
        let lp = SubmissionLoop::new(client.clone(), three_accounts(), None, "x", &run_config(1000, 1));
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(client.call_count(), 0);
        assert!(collect(&mut handle).is_empty());
        finish(&mut handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_recipient_and_payload() {
        let client = Arc::new(MockClient::accepting());
        let recipient = Address::repeat_byte(0x42);
        let lp = SubmissionLoop::new(
            client.clone(),
            three_accounts(),
            Some(recipient),
            "data:,hi",
            &run_config(500, 1),
        );
        let mut handle = lp.spawn();
        tokio::time::sleep(Duration::from_millis(600)).await;
        finish(&mut handle).await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        for (_, to, data) in requests.iter() {
            assert_eq!(*to, recipient);
            assert_eq!(data.as_ref(), b"data:,hi");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_become_failure_records() {
        let client = Arc::new(MockClient::rejecting("X"));
        let accounts = three_accounts();
        let shorts: Vec<String> = accounts.iter().map(|a| shorten_address(&a.address())).collect();
        let lp = SubmissionLoop::new(client.clone(), accounts, None, "x", &run_config(1000, 1));
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let records = collect(&mut handle);
        assert_eq!(records.len(), 6);
        for (i, record) in records.iter().enumerate() {
            let LogRecord::Failure { message, .. } = record else {
                panic!("expected failure record");
            };
            assert!(message.contains('X'));
            assert!(message.contains(&shorts[i % 3]));
        }

        let summary = finish(&mut handle).await;
        assert_eq!(summary.failed, 6);
        assert_eq!(summary.submitted, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let client = Arc::new(MockClient::accepting());
        let lp = SubmissionLoop::new(client.clone(), three_accounts(), None, "x", &run_config(1000, 1));
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let summary = finish(&mut handle).await;
        assert_eq!(summary.ticks, 1);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(client.call_count(), 3);
        assert_eq!(collect(&mut handle).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_tick_finishes_after_stop() {
        let client = Arc::new(MockClient::accepting().with_delay(Duration::from_millis(400)));
        let lp = SubmissionLoop::new(client.clone(), three_accounts(), None, "x", &run_config(1000, 1));
        let mut handle = lp.spawn();

        // the first tick is mid-way through its second account
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let summary = finish(&mut handle).await;

        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(collect(&mut handle).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_tick_is_skipped() {
        let client = Arc::new(MockClient::accepting().with_delay(Duration::from_millis(2500)));
        let accounts = three_accounts().into_iter().take(1).collect();
        let lp = SubmissionLoop::new(client.clone(), accounts, None, "x", &run_config(1000, 1));
        let mut handle = lp.spawn();

        // ticks at 1000 (runs to 3500), 2000 and 3000 skipped, 4000 runs
        tokio::time::sleep(Duration::from_millis(4500)).await;
        let summary = finish(&mut handle).await;

        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.skipped_ticks, 2);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_overlap() {
        let client = Arc::new(MockClient::accepting().with_delay(Duration::from_millis(2500)));
        let accounts = three_accounts().into_iter().take(1).collect();
        let lp = SubmissionLoop::new(client.clone(), accounts, None, "x", &run_config(1000, 3));
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(4500)).await;
        let summary = finish(&mut handle).await;

        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.skipped_ticks, 0);
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_cap_still_waits_for_in_flight_tick() {
        let client = Arc::new(MockClient::accepting().with_delay(Duration::from_millis(400)));
        let mut config = RunConfig::new(default_chain(), None, 1000);
        config.max_in_flight_ticks = (1 << 32) + 1;
        let lp = SubmissionLoop::new(client.clone(), three_accounts(), None, "x", &config);
        assert_eq!(lp.max_in_flight_ticks, crate::config::MAX_IN_FLIGHT_TICKS);
        let mut handle = lp.spawn();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let summary = finish(&mut handle).await;

        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(collect(&mut handle).len(), 3);
    }

    #[test]
    fn test_spawn_outside_runtime_uses_thread() {
        let client = Arc::new(MockClient::accepting());
        let lp = SubmissionLoop::new(client, three_accounts(), None, "x", &run_config(5, 1));
        let mut handle = lp.spawn();

        std::thread::sleep(Duration::from_millis(100));
        handle.request_stop();
        let summary = loop {
            if let Some(res) = handle.poll_summary() {
                break res.unwrap();
            }
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(summary.ticks >= 1);
        assert_eq!(summary.submitted, summary.succeeded);
    }

    #[test]
    fn test_run_summary_text() {
        let summary = RunSummary {
            chain_id: 56,
            ticks: 3,
            skipped_ticks: 1,
            submitted: 6,
            succeeded: 5,
            failed: 1,
        };
        assert_eq!(
            summary.summary(),
            "Ticks: 3 (skipped 1) | Submitted: 6 | Success: 5 | Failed: 1"
        );
    }
}
