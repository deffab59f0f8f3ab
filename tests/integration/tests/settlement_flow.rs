//! Integration test: the full settlement loop across crates.
//!
//! Wires the invoice ledger, settlement watcher and payment pipeline
//! over the in-memory dev chain the same way the demo node does, with
//! tokio channels standing in for the external notification transport.

use std::sync::Arc;
use std::time::Duration;

use memopay_chain::DevChain;
use memopay_core::{InvoiceStatus, WireMessage};
use memopay_integration_tests::{stack, token, wait_until};
use memopay_merchant::{InvoiceLedger, SettlementWatcher, WatcherConfig, WatcherHandle};
use memopay_payer::PaymentPipeline;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const FAST_POLL: Duration = Duration::from_millis(20);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn watcher + pipeline + transport bridge, returning the
/// notification sender, a subscriber for assertions, and the handles.
fn spawn_stack(
    chain: &Arc<DevChain>,
    ledger: &Arc<InvoiceLedger>,
    merchant: &memopay_core::Address,
    payer: &memopay_core::Address,
) -> (
    broadcast::Sender<WireMessage>,
    broadcast::Receiver<WireMessage>,
    WatcherHandle,
    JoinHandle<()>,
    JoinHandle<()>,
) {
    let (notifications, bridge_rx) = broadcast::channel::<WireMessage>(64);
    let observer = notifications.subscribe();

    let watcher = SettlementWatcher::new(
        Arc::clone(chain),
        Arc::clone(ledger),
        merchant.clone(),
        WatcherConfig {
            poll_interval: FAST_POLL,
            lookback: 64,
        },
        notifications.clone(),
    );
    let watcher_handle = watcher.spawn();

    let (payer_tx, payer_rx) = mpsc::channel::<WireMessage>(64);
    let pipeline = PaymentPipeline::new(Arc::clone(chain), token(), payer.clone(), true);
    let pipeline_task = tokio::spawn(pipeline.run(payer_rx));

    let bridge_task = tokio::spawn(async move {
        let mut rx = bridge_rx;
        while let Ok(message) = rx.recv().await {
            if payer_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    (
        notifications,
        observer,
        watcher_handle,
        pipeline_task,
        bridge_task,
    )
}

async fn all_paid(ledger: &Arc<InvoiceLedger>) -> bool {
    ledger
        .list()
        .iter()
        .all(|i| i.status == InvoiceStatus::Paid)
}

#[tokio::test]
async fn test_end_to_end_settlement() {
    let (chain, ledger, merchant, payer) = stack("100");
    let (notifications, mut observer, watcher, pipeline_task, bridge_task) =
        spawn_stack(&chain, &ledger, &merchant, &payer);

    let first = ledger.create("10.50", "coffee").unwrap();
    notifications
        .send(WireMessage::InvoiceCreated {
            invoice: first.clone(),
        })
        .unwrap();
    let second = ledger.create("3.25", "tea").unwrap();
    notifications
        .send(WireMessage::InvoiceCreated {
            invoice: second.clone(),
        })
        .unwrap();

    let ledger_ref = Arc::clone(&ledger);
    wait_until(SETTLE_TIMEOUT, move || {
        let ledger = Arc::clone(&ledger_ref);
        async move { all_paid(&ledger).await }
    })
    .await;

    // Settled invoices carry the payer and a transaction reference.
    for invoice in ledger.list() {
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.payer.as_ref(), Some(&payer));
        assert!(invoice.tx_ref.is_some());
        assert!(invoice.paid_at.is_some());
    }

    // The merchant received exactly the invoiced total.
    use memopay_chain::LedgerClient;
    assert_eq!(
        chain.balance_of(&merchant).await.unwrap(),
        10_500_000 + 3_250_000
    );

    watcher.stop();
    watcher.join().await;
    drop(notifications);
    let _ = bridge_task.await;
    let _ = pipeline_task.await;

    // Exactly one paid notification per invoice, even though the
    // watcher kept re-polling after settlement.
    let mut paid_ids = Vec::new();
    while let Ok(message) = observer.try_recv() {
        if let WireMessage::InvoicePaid { invoice } = message {
            paid_ids.push(invoice.id);
        }
    }
    paid_ids.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(paid_ids, expected);
}

#[tokio::test]
async fn test_preexisting_invoices_settle_via_snapshot() {
    let (chain, ledger, merchant, payer) = stack("100");

    // Invoices exist before the payer connects.
    ledger.create("1", "").unwrap();
    ledger.create("2", "").unwrap();

    let (notifications, _observer, watcher, pipeline_task, bridge_task) =
        spawn_stack(&chain, &ledger, &merchant, &payer);

    // A connecting viewer is brought up to date with a snapshot.
    notifications
        .send(WireMessage::Snapshot {
            invoices: ledger.list(),
        })
        .unwrap();

    let ledger_ref = Arc::clone(&ledger);
    wait_until(SETTLE_TIMEOUT, move || {
        let ledger = Arc::clone(&ledger_ref);
        async move { all_paid(&ledger).await }
    })
    .await;

    watcher.stop();
    watcher.join().await;
    drop(notifications);
    let _ = bridge_task.await;
    let _ = pipeline_task.await;
}

#[tokio::test]
async fn test_underfunded_invoice_skipped_rest_settle() {
    // Balance covers only the small invoice.
    let (chain, ledger, merchant, payer) = stack("5");
    let (notifications, _observer, watcher, pipeline_task, bridge_task) =
        spawn_stack(&chain, &ledger, &merchant, &payer);

    let too_big = ledger.create("50", "").unwrap();
    let affordable = ledger.create("3", "").unwrap();
    notifications
        .send(WireMessage::InvoiceCreated { invoice: too_big })
        .unwrap();
    notifications
        .send(WireMessage::InvoiceCreated {
            invoice: affordable.clone(),
        })
        .unwrap();

    let ledger_ref = Arc::clone(&ledger);
    let affordable_id = affordable.id.clone();
    wait_until(SETTLE_TIMEOUT, move || {
        let ledger = Arc::clone(&ledger_ref);
        let id = affordable_id.clone();
        async move {
            ledger
                .list()
                .iter()
                .any(|i| i.id == id && i.status == InvoiceStatus::Paid)
        }
    })
    .await;

    // The oversized invoice stays pending; the pipeline moved on.
    let statuses: Vec<InvoiceStatus> = ledger.list().iter().map(|i| i.status).collect();
    assert!(statuses.contains(&InvoiceStatus::Pending));
    assert!(statuses.contains(&InvoiceStatus::Paid));

    watcher.stop();
    watcher.join().await;
    drop(notifications);
    let _ = bridge_task.await;
    let _ = pipeline_task.await;
}

#[tokio::test]
async fn test_watcher_restart_rescan_is_quiet() {
    let (chain, ledger, merchant, payer) = stack("100");

    // Pay an invoice directly through the pipeline, then let two
    // successive watcher "incarnations" scan the same range.
    let invoice = ledger.create("10.50", "").unwrap();
    let pipeline = PaymentPipeline::new(Arc::clone(&chain), token(), payer, true);
    pipeline.process_one(&invoice).await.unwrap();

    let (first_tx, mut first_rx) = broadcast::channel(16);
    let mut first = SettlementWatcher::new(
        Arc::clone(&chain),
        Arc::clone(&ledger),
        merchant.clone(),
        WatcherConfig::default(),
        first_tx,
    );
    assert_eq!(first.tick().await.unwrap(), 1);
    assert!(matches!(
        first_rx.try_recv().unwrap(),
        WireMessage::InvoicePaid { .. }
    ));

    // Restarted watcher re-scans from its lookback window: no state
    // change, no duplicate notification.
    let (second_tx, mut second_rx) = broadcast::channel(16);
    let mut second = SettlementWatcher::new(
        chain,
        Arc::clone(&ledger),
        merchant,
        WatcherConfig::default(),
        second_tx,
    );
    assert_eq!(second.tick().await.unwrap(), 0);
    assert!(second_rx.try_recv().is_err());
    assert_eq!(ledger.list()[0].status, InvoiceStatus::Paid);
}
