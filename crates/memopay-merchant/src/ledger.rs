//! The invoice ledger: single source of truth for invoice existence and
//! settlement status.
//!
//! All mutation funnels through `create` and `settle`. The map is keyed
//! by memo, so concurrent settles of one invoice serialize on a single
//! entry lock and at most one caller observes the pending→paid
//! transition.

use chrono::Utc;
use dashmap::DashMap;
use memopay_core::{
    Address, CoreError, Invoice, InvoiceId, InvoiceStatus, Memo, TokenConfig, TxRef,
};

/// In-process store of invoices, keyed by memo.
pub struct InvoiceLedger {
    token: TokenConfig,
    merchant: Address,
    invoices: DashMap<Memo, Invoice>,
}

impl InvoiceLedger {
    /// Create an empty ledger for the given token and merchant account.
    pub fn new(token: TokenConfig, merchant: Address) -> Self {
        Self {
            token,
            merchant,
            invoices: DashMap::new(),
        }
    }

    /// Create a pending invoice for `amount` (a decimal string in token
    /// units). Fails if the amount is missing, non-numeric, non-positive
    /// or more precise than the token allows.
    pub fn create(&self, amount: &str, note: &str) -> Result<Invoice, CoreError> {
        let amount_units = self.token.parse_amount(amount)?;
        let id = InvoiceId::generate();
        let memo = Memo::derive(&id)?;

        let invoice = Invoice {
            id,
            memo: memo.clone(),
            note: note.to_string(),
            merchant_address: self.merchant.clone(),
            amount: self.token.format_units(amount_units),
            amount_units,
            status: InvoiceStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
            tx_ref: None,
            payer: None,
        };
        self.invoices.insert(memo, invoice.clone());
        tracing::info!(
            invoice = %invoice.id,
            amount = %invoice.amount,
            symbol = %self.token.symbol,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Apply an observed transfer to the invoice carrying `memo`.
    ///
    /// Returns the updated invoice to exactly one caller on the
    /// pending→paid transition. Returns `None` when no invoice carries
    /// the memo, when the invoice is already paid, or when the observed
    /// value differs from the invoiced amount — all routine outcomes for
    /// a watcher re-scanning overlapping ranges, which is what makes
    /// re-scanning safe.
    pub fn settle(
        &self,
        memo: &Memo,
        observed_value: u128,
        tx_ref: TxRef,
        payer: Address,
    ) -> Option<Invoice> {
        let mut entry = self.invoices.get_mut(memo)?;
        let invoice = entry.value_mut();

        if invoice.status == InvoiceStatus::Paid {
            return None;
        }
        if invoice.amount_units != observed_value {
            tracing::debug!(
                invoice = %invoice.id,
                expected = invoice.amount_units,
                observed = observed_value,
                "transfer value does not match invoice, ignoring"
            );
            return None;
        }

        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(Utc::now());
        invoice.tx_ref = Some(tx_ref);
        invoice.payer = Some(payer);
        tracing::info!(
            invoice = %invoice.id,
            tx = %invoice.tx_ref.as_ref().map(|t| t.as_str()).unwrap_or_default(),
            "invoice paid"
        );
        Some(invoice.clone())
    }

    /// All invoices, newest-created-first. Ties are broken by id so the
    /// order is total and deterministic.
    pub fn list(&self) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self.invoices.iter().map(|e| e.value().clone()).collect();
        invoices.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        invoices
    }

    /// Number of invoices in the ledger.
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    /// Whether the ledger holds no invoices.
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}
