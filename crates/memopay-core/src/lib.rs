//! Memopay core
//!
//! Shared domain types for invoice settlement over a memo-tagged token
//! ledger: invoices and their lifecycle, fixed-width memos, exact-unit
//! token amounts, wire messages, and process configuration.

pub mod config;
pub mod error;
pub mod message;
pub mod token;
pub mod types;

pub use config::AppConfig;
pub use error::CoreError;
pub use message::WireMessage;
pub use token::TokenConfig;
pub use types::{Address, Invoice, InvoiceId, InvoiceStatus, Memo, PrivateKey, TxRef};
