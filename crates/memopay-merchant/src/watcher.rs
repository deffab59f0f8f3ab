//! The settlement watcher: bridges the external event log to the
//! invoice ledger.
//!
//! The event source offers at-least-once delivery and ranges overlap
//! after errors and restarts, so the watcher never deduplicates by log
//! position. Exactly-once effective application comes from the ledger:
//! `settle` is idempotent on memo + status.

use std::sync::Arc;
use std::time::Duration;

use memopay_core::{Address, WireMessage};
use memopay_chain::{ChainError, LedgerClient};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::ledger::InvoiceLedger;

/// Watcher tuning.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Delay between poll ticks.
    pub poll_interval: Duration,
    /// How far behind the head the cursor starts on first run.
    ///
    /// Known gap: events older than this window at startup are never
    /// scanned, so invoices paid during an outage longer than the
    /// window are not reconciled by this process.
    pub lookback: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            lookback: 64,
        }
    }
}

/// Polls the ledger for memo-tagged transfers to the merchant and
/// applies matches to the invoice ledger, emitting one `invoice.paid`
/// notification per settled invoice.
pub struct SettlementWatcher<C: LedgerClient> {
    chain: Arc<C>,
    ledger: Arc<InvoiceLedger>,
    merchant: Address,
    config: WatcherConfig,
    notifications: broadcast::Sender<WireMessage>,
    /// Next unscanned log position. `None` until the first tick.
    cursor: Option<u64>,
}

impl<C: LedgerClient + 'static> SettlementWatcher<C> {
    /// Create a watcher. The cursor initializes lazily on the first
    /// tick, `lookback` positions behind the then-current head.
    pub fn new(
        chain: Arc<C>,
        ledger: Arc<InvoiceLedger>,
        merchant: Address,
        config: WatcherConfig,
        notifications: broadcast::Sender<WireMessage>,
    ) -> Self {
        Self {
            chain,
            ledger,
            merchant,
            config,
            notifications,
            cursor: None,
        }
    }

    /// One poll iteration. Returns the number of invoices settled.
    ///
    /// The cursor advances past the scanned range only after the whole
    /// batch was processed; on error it stays put and the next tick
    /// re-fetches the full range.
    pub async fn tick(&mut self) -> Result<usize, ChainError> {
        let latest = self.chain.head_position().await?;
        let from = match self.cursor {
            Some(position) => position,
            None => {
                let start = latest.saturating_sub(self.config.lookback);
                self.cursor = Some(start);
                tracing::info!(start, head = latest, "cursor initialized");
                start
            }
        };
        if from > latest {
            return Ok(0);
        }

        let batch = self
            .chain
            .transfer_events(&self.merchant, from, latest)
            .await?;

        let mut settled = 0;
        for event in batch {
            let (Some(memo), Some(value), Some(payer)) = (event.memo, event.value, event.from)
            else {
                tracing::warn!(tx = %event.tx_ref, "skipping malformed transfer event");
                continue;
            };
            if let Some(invoice) = self.ledger.settle(&memo, value, event.tx_ref, payer) {
                settled += 1;
                // Fan-out is best-effort; no receivers is fine.
                let _ = self
                    .notifications
                    .send(WireMessage::InvoicePaid { invoice });
            }
        }

        self.cursor = Some(latest + 1);
        Ok(settled)
    }

    /// Run the poll loop until a stop signal is observed. The signal is
    /// checked between ticks only: an in-flight tick runs to completion.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        tracing::info!(merchant = %self.merchant, "settlement watcher started");
        loop {
            if *stop.borrow() {
                break;
            }
            match self.tick().await {
                Ok(settled) if settled > 0 => {
                    tracing::debug!(settled, "tick applied settlements");
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(%error, "event fetch failed, range will be re-scanned");
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = stop.changed() => {
                    // A dropped stop handle means no one is left to run us.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("settlement watcher stopped");
    }

    /// Spawn the poll loop in a background task.
    pub fn spawn(self) -> WatcherHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        WatcherHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Handle to a spawned watcher.
pub struct WatcherHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Request a cooperative stop.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Wait for the watcher task to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
