use memopay_core::{Address, Memo, TxRef};

/// A memo-tagged transfer event as observed on the ledger.
///
/// Indexed arguments arrive independently from the event source, so any
/// of them can be absent on a malformed event. Consumers skip events
/// with missing fields rather than failing a whole batch.
#[derive(Debug, Clone)]
pub struct RawTransferEvent {
    /// Paying account.
    pub from: Option<Address>,
    /// Receiving account (always present: events are fetched by recipient).
    pub to: Address,
    /// Transferred value in smallest units.
    pub value: Option<u128>,
    /// Correlation memo.
    pub memo: Option<Memo>,
    /// Transaction carrying the event.
    pub tx_ref: TxRef,
    /// Ledger position the event was recorded at.
    pub position: u64,
}

/// Terminal state of a submitted transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// The transfer executed and is final.
    Success,
    /// The transfer reverted; no value moved.
    Reverted,
}

/// Result of waiting for a transfer to reach a confirmed terminal state.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub status: ConfirmationStatus,
    /// Account the transfer was submitted from.
    pub payer: Address,
    /// Transferred value in smallest units.
    pub value: u128,
}
