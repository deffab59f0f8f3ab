//! The outbound payment pipeline.
//!
//! A single consumer task drains the notification channel, so invoices
//! are paid strictly in arrival order with never more than one transfer
//! in flight — the ordering and single-flight guarantees are carried by
//! the task structure, not by a lock.
//!
//! Failed payments are not retried: the invoice stays pending on the
//! merchant side and is dropped from this run. The seen-set keeps even
//! a re-delivered notification from resubmitting within one process
//! lifetime; recovery needs a fresh process receiving a snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use memopay_chain::{ConfirmationStatus, LedgerClient};
use memopay_core::{Address, Invoice, InvoiceId, InvoiceStatus, TokenConfig, TxRef, WireMessage};
use tokio::sync::mpsc;

use crate::error::PayerError;

/// Consumes invoice notifications and settles pending invoices, one at
/// a time.
pub struct PaymentPipeline<C: LedgerClient> {
    chain: Arc<C>,
    token: TokenConfig,
    /// Account the payer spends from.
    account: Address,
    /// Whether notifications are honored without manual approval.
    auto_accept: bool,
    /// Invoice ids already queued once. Append-only for the process
    /// lifetime; dedupes snapshots overlapping with incremental events.
    seen: HashSet<InvoiceId>,
}

impl<C: LedgerClient> PaymentPipeline<C> {
    /// Create a pipeline paying from `account`.
    pub fn new(chain: Arc<C>, token: TokenConfig, account: Address, auto_accept: bool) -> Self {
        Self {
            chain,
            token,
            account,
            auto_accept,
            seen: HashSet::new(),
        }
    }

    /// Drain notifications until the channel closes.
    pub async fn run(mut self, mut notifications: mpsc::Receiver<WireMessage>) {
        tracing::info!(
            account = %self.account,
            auto_accept = self.auto_accept,
            "payment pipeline started"
        );
        while let Some(message) = notifications.recv().await {
            self.handle_message(message).await;
        }
        tracing::info!("payment pipeline stopped");
    }

    /// Process one notification to completion.
    pub async fn handle_message(&mut self, message: WireMessage) {
        match message {
            WireMessage::Snapshot { invoices } => {
                if !self.auto_accept {
                    return;
                }
                for invoice in invoices {
                    self.accept(invoice).await;
                }
            }
            WireMessage::InvoiceCreated { invoice } => {
                if self.auto_accept {
                    self.accept(invoice).await;
                }
            }
            WireMessage::InvoicePaid { invoice } => {
                tracing::info!(invoice = %invoice.id, "merchant marked invoice paid");
            }
        }
    }

    /// Queue an invoice for payment if it is pending and not yet seen,
    /// then pay it. One invoice's failure never aborts the pipeline.
    async fn accept(&mut self, invoice: Invoice) {
        if invoice.status != InvoiceStatus::Pending || !self.seen.insert(invoice.id.clone()) {
            return;
        }
        if let Err(error) = self.process_one(&invoice).await {
            tracing::error!(invoice = %invoice.id, %error, "payment failed, invoice skipped");
        }
    }

    /// Pay a single invoice: balance check, memo-tagged transfer of the
    /// exact invoiced amount, confirmation wait.
    pub async fn process_one(&self, invoice: &Invoice) -> Result<TxRef, PayerError> {
        let balance = self.chain.balance_of(&self.account).await?;
        if balance < invoice.amount_units {
            return Err(PayerError::InsufficientFunds {
                symbol: self.token.symbol.clone(),
                balance: self.token.format_units(balance),
                required: invoice.amount.clone(),
            });
        }

        tracing::info!(
            invoice = %invoice.id,
            amount = %invoice.amount,
            symbol = %self.token.symbol,
            to = %invoice.merchant_address,
            "submitting payment"
        );
        let tx_ref = self
            .chain
            .submit_transfer(
                &self.account,
                &invoice.merchant_address,
                invoice.amount_units,
                &invoice.memo,
            )
            .await?;
        tracing::info!(invoice = %invoice.id, tx = %tx_ref, "transfer submitted");

        let confirmation = self.chain.await_confirmation(&tx_ref).await?;
        if confirmation.status != ConfirmationStatus::Success {
            return Err(PayerError::SettlementFailed(tx_ref));
        }
        tracing::info!(invoice = %invoice.id, tx = %tx_ref, "payment confirmed");
        Ok(tx_ref)
    }
}
