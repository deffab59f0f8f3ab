use memopay_core::TxRef;

/// Ledger client errors.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The ledger endpoint could not be reached or returned a transient
    /// failure. Callers retry on their own schedule.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown transaction: {0}")]
    UnknownTx(TxRef),

    #[error("invalid range: {from}..={to}")]
    InvalidRange { from: u64, to: u64 },
}
