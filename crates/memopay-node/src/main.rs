//! Memopay demo node.
//!
//! Runs the full settlement flow in one process over the in-memory dev
//! chain: the merchant ledger creates invoices, the payment pipeline
//! honors them, and the settlement watcher reconciles the resulting
//! transfers back to the ledger.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use memopay_chain::DevChain;
use memopay_core::{AppConfig, InvoiceStatus, WireMessage};
use memopay_merchant::{InvoiceLedger, SettlementWatcher, WatcherConfig};
use memopay_payer::PaymentPipeline;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "memopay-node", about = "Memo-correlated invoice settlement demo")]
struct Cli {
    /// Path to a TOML config file. Without it the built-in dev accounts
    /// are used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Invoice amounts to create, in token units (repeatable).
    #[arg(long = "invoice", value_name = "AMOUNT")]
    invoices: Vec<String>,

    /// Seconds to wait for all invoices to settle.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => AppConfig::dev(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let token = config.token_config()?;
    let merchant = config.merchant_address()?;
    let payer = config.payer_address()?;

    let chain = Arc::new(DevChain::new());
    let starting_balance = token.parse_amount(&config.payer.dev_balance)?;
    chain.credit(&payer, starting_balance);
    tracing::info!(
        account = %payer,
        balance = %config.payer.dev_balance,
        symbol = %token.symbol,
        "dev chain seeded"
    );

    let ledger = Arc::new(InvoiceLedger::new(token.clone(), merchant.clone()));

    // Merchant-side notification stream: watcher and ledger events fan
    // out here; the bridge below plays the external transport.
    let (notifications, bridge_rx) = broadcast::channel::<WireMessage>(64);

    let watcher = SettlementWatcher::new(
        Arc::clone(&chain),
        Arc::clone(&ledger),
        merchant.clone(),
        WatcherConfig {
            poll_interval: Duration::from_millis(config.merchant.poll_interval_ms),
            lookback: config.merchant.lookback,
        },
        notifications.clone(),
    );
    let watcher_handle = watcher.spawn();

    let (payer_tx, payer_rx) = mpsc::channel::<WireMessage>(64);
    let pipeline = PaymentPipeline::new(
        Arc::clone(&chain),
        token.clone(),
        payer,
        config.payer.auto_accept,
    );
    let pipeline_task = tokio::spawn(pipeline.run(payer_rx));

    // Bridge merchant notifications to the payer, standing in for the
    // pub/sub transport a deployment would use.
    let bridge_payer_tx = payer_tx.clone();
    let bridge_task = tokio::spawn(async move {
        let mut rx = bridge_rx;
        loop {
            match rx.recv().await {
                Ok(message) => {
                    if bridge_payer_tx.send(message).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "bridge lagged, payer should resync");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // A connecting viewer starts from a snapshot.
    payer_tx
        .send(WireMessage::Snapshot {
            invoices: ledger.list(),
        })
        .await
        .ok();

    let amounts = if cli.invoices.is_empty() {
        vec!["10.50".to_string(), "3.25".to_string()]
    } else {
        cli.invoices.clone()
    };
    for amount in &amounts {
        let invoice = ledger
            .create(amount, "demo invoice")
            .with_context(|| format!("creating invoice for {}", amount))?;
        let _ = notifications.send(WireMessage::InvoiceCreated { invoice });
    }

    // Wait for the watcher to reconcile every invoice.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.timeout_secs);
    loop {
        let invoices = ledger.list();
        if invoices.iter().all(|i| i.status == InvoiceStatus::Paid) {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            let pending = invoices
                .iter()
                .filter(|i| i.status == InvoiceStatus::Pending)
                .count();
            watcher_handle.stop();
            watcher_handle.join().await;
            bail!("{} invoices still pending after {}s", pending, cli.timeout_secs);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    for invoice in ledger.list() {
        tracing::info!(
            invoice = %invoice.id,
            amount = %invoice.amount,
            status = %invoice.status,
            tx = %invoice
                .tx_ref
                .as_ref()
                .map(|t| config.tx_url(t))
                .unwrap_or_default(),
            "settled"
        );
    }

    watcher_handle.stop();
    watcher_handle.join().await;
    drop(notifications);
    drop(payer_tx);
    let _ = bridge_task.await;
    let _ = pipeline_task.await;

    tracing::info!("all invoices settled");
    Ok(())
}
