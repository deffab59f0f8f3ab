//! Memopay merchant side
//!
//! The invoice ledger (create / settle / list) and the settlement
//! watcher that reconciles on-ledger transfers back to invoices.

pub mod ledger;
pub mod watcher;

pub use ledger::InvoiceLedger;
pub use watcher::{SettlementWatcher, WatcherConfig, WatcherHandle};
