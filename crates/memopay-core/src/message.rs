//! Wire messages exchanged between the merchant and invoice viewers.
//!
//! Delivery is best-effort, at-most-once: a consumer that misses
//! incremental events recovers by requesting a fresh snapshot.

use serde::{Deserialize, Serialize};

use crate::types::Invoice;

/// A message on the invoice notification stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Full state of the invoice ledger.
    #[serde(rename = "snapshot")]
    Snapshot { invoices: Vec<Invoice> },
    /// A new invoice was created.
    #[serde(rename = "invoice.created")]
    InvoiceCreated { invoice: Invoice },
    /// An invoice transitioned to paid.
    #[serde(rename = "invoice.paid")]
    InvoicePaid { invoice: Invoice },
}
