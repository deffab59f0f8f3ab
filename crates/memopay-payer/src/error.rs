use memopay_chain::ChainError;
use memopay_core::TxRef;

/// Payment pipeline errors. All of them are invoice-level: they are
/// logged and the pipeline moves on to the next queued invoice.
#[derive(Debug, thiserror::Error)]
pub enum PayerError {
    #[error("insufficient {symbol}: balance={balance} required={required}")]
    InsufficientFunds {
        symbol: String,
        balance: String,
        required: String,
    },

    #[error("transfer reverted: {0}")]
    SettlementFailed(TxRef),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
