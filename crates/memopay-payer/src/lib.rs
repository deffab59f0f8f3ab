//! Memopay payer side
//!
//! The outbound payment pipeline: consumes invoice notifications and
//! settles pending invoices with serialized, memo-tagged transfers.

pub mod error;
pub mod pipeline;

pub use error::PayerError;
pub use pipeline::PaymentPipeline;
