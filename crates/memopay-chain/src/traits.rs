use async_trait::async_trait;
use memopay_core::{Address, Memo, TxRef};

use crate::error::ChainError;
use crate::types::{Confirmation, RawTransferEvent};

/// Ledger client capability.
///
/// The one seam between memopay and the underlying ledger. Treated as
/// reliable-but-slow: calls are not retried here; the settlement
/// watcher's tick loop and the payment pipeline decide what a failure
/// means for them.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current head position of the append-only event log.
    async fn head_position(&self) -> Result<u64, ChainError>;

    /// Memo-tagged transfer events addressed to `to` within
    /// `[from_pos, to_pos]` inclusive. Plain transfers without a memo
    /// are never returned: they carry no correlation key.
    async fn transfer_events(
        &self,
        to: &Address,
        from_pos: u64,
        to_pos: u64,
    ) -> Result<Vec<RawTransferEvent>, ChainError>;

    /// Current token balance of `account`, in smallest units.
    async fn balance_of(&self, account: &Address) -> Result<u128, ChainError>;

    /// Submit a memo-tagged transfer and return its transaction
    /// reference. Submission is not settlement: the transfer is final
    /// only once [`await_confirmation`](Self::await_confirmation)
    /// reports a terminal state.
    async fn submit_transfer(
        &self,
        from: &Address,
        to: &Address,
        value: u128,
        memo: &Memo,
    ) -> Result<TxRef, ChainError>;

    /// Wait until the transfer reaches a confirmed terminal state with
    /// at least one confirmation.
    async fn await_confirmation(&self, tx_ref: &TxRef) -> Result<Confirmation, ChainError>;
}
