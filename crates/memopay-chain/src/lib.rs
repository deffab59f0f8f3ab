//! Memopay ledger client layer
//!
//! Defines the capability boundary to the underlying token ledger
//! (head position, ranged event fetch, balances, transfer submission,
//! confirmation waits) and ships an in-memory dev chain implementing it.

pub mod dev;
pub mod error;
pub mod traits;
pub mod types;

pub use dev::DevChain;
pub use error::ChainError;
pub use traits::LedgerClient;
pub use types::{Confirmation, ConfirmationStatus, RawTransferEvent};
