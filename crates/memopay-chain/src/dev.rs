//! In-memory ledger used by tests and the demo node.
//!
//! One position per transfer, instant single confirmation, balance
//! enforcement at submission (an underfunded transfer reverts instead
//! of erroring, matching how a real rail reports it).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use memopay_core::{Address, Memo, TxRef};

use crate::error::ChainError;
use crate::traits::LedgerClient;
use crate::types::{Confirmation, ConfirmationStatus, RawTransferEvent};

/// In-memory dev chain.
pub struct DevChain {
    /// Head position; position 0 is the empty genesis.
    head: AtomicU64,
    /// Events keyed by ledger position.
    events: DashMap<u64, Vec<RawTransferEvent>>,
    /// Token balances in smallest units.
    balances: DashMap<Address, u128>,
    /// Terminal states keyed by transaction reference.
    confirmations: DashMap<TxRef, Confirmation>,
    /// Remaining event fetches to fail with a transport error.
    failing_fetches: AtomicU32,
}

impl DevChain {
    /// Create an empty dev chain.
    pub fn new() -> Self {
        Self {
            head: AtomicU64::new(0),
            events: DashMap::new(),
            balances: DashMap::new(),
            confirmations: DashMap::new(),
            failing_fetches: AtomicU32::new(0),
        }
    }

    /// Credit an account, minting balance out of thin air.
    pub fn credit(&self, account: &Address, value: u128) {
        self.balances
            .entry(account.clone())
            .and_modify(|b| *b += value)
            .or_insert(value);
    }

    /// Advance the head by `n` positions without recording any events.
    pub fn advance_head(&self, n: u64) {
        self.head.fetch_add(n, Ordering::SeqCst);
    }

    /// Fail the next `n` calls to `transfer_events` with a transport
    /// error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.failing_fetches.store(n, Ordering::SeqCst);
    }

    /// Record a pre-built event at a fresh position. Lets tests inject
    /// malformed events the submission path can never produce.
    pub fn push_event(&self, mut event: RawTransferEvent) -> u64 {
        let position = self.head.fetch_add(1, Ordering::SeqCst) + 1;
        event.position = position;
        self.events.entry(position).or_default().push(event);
        position
    }

    fn fresh_tx_ref() -> TxRef {
        TxRef::new(format!("0x{}", hex::encode(rand::random::<[u8; 32]>())))
    }
}

impl Default for DevChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for DevChain {
    async fn head_position(&self) -> Result<u64, ChainError> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn transfer_events(
        &self,
        to: &Address,
        from_pos: u64,
        to_pos: u64,
    ) -> Result<Vec<RawTransferEvent>, ChainError> {
        if from_pos > to_pos {
            return Err(ChainError::InvalidRange {
                from: from_pos,
                to: to_pos,
            });
        }
        if self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ChainError::Transport("injected fetch failure".into()));
        }

        let mut matched = Vec::new();
        for position in from_pos..=to_pos {
            if let Some(batch) = self.events.get(&position) {
                matched.extend(batch.iter().filter(|e| &e.to == to).cloned());
            }
        }
        Ok(matched)
    }

    async fn balance_of(&self, account: &Address) -> Result<u128, ChainError> {
        Ok(self.balances.get(account).map(|b| *b).unwrap_or(0))
    }

    async fn submit_transfer(
        &self,
        from: &Address,
        to: &Address,
        value: u128,
        memo: &Memo,
    ) -> Result<TxRef, ChainError> {
        let tx_ref = Self::fresh_tx_ref();

        {
            let mut sender = self.balances.entry(from.clone()).or_insert(0);
            if *sender < value {
                drop(sender);
                self.confirmations.insert(
                    tx_ref.clone(),
                    Confirmation {
                        status: ConfirmationStatus::Reverted,
                        payer: from.clone(),
                        value,
                    },
                );
                tracing::debug!(tx = %tx_ref, %from, value, "transfer reverted: insufficient balance");
                return Ok(tx_ref);
            }
            *sender -= value;
        }
        self.balances
            .entry(to.clone())
            .and_modify(|b| *b += value)
            .or_insert(value);

        let position = self.head.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.entry(position).or_default().push(RawTransferEvent {
            from: Some(from.clone()),
            to: to.clone(),
            value: Some(value),
            memo: Some(memo.clone()),
            tx_ref: tx_ref.clone(),
            position,
        });
        self.confirmations.insert(
            tx_ref.clone(),
            Confirmation {
                status: ConfirmationStatus::Success,
                payer: from.clone(),
                value,
            },
        );
        tracing::debug!(tx = %tx_ref, %from, %to, value, position, "transfer recorded");
        Ok(tx_ref)
    }

    async fn await_confirmation(&self, tx_ref: &TxRef) -> Result<Confirmation, ChainError> {
        self.confirmations
            .get(tx_ref)
            .map(|c| c.clone())
            .ok_or_else(|| ChainError::UnknownTx(tx_ref.clone()))
    }
}
