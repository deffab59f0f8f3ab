use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Width of an on-ledger memo in bytes.
pub const MEMO_BYTES: usize = 32;

/// Process-unique invoice identifier.
/// Format: `INV-<unix millis>-<8 hex chars of a UUIDv7>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(String);

impl InvoiceId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let uuid = Uuid::now_v7().simple().to_string();
        Self(format!("INV-{}-{}", Utc::now().timestamp_millis(), &uuid[..8]))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-width memo correlating an on-ledger transfer with an invoice.
///
/// Stored as `0x` + 64 lowercase hex chars (32 bytes). Normalizing to
/// lowercase at construction makes memo comparison and map lookup
/// case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Memo(String);

impl Memo {
    /// Derive the memo for an invoice id: UTF-8 bytes of the id,
    /// zero-padded to 32 bytes, hex-encoded.
    ///
    /// Injective for ids of at most 32 bytes; longer ids are rejected.
    pub fn derive(id: &InvoiceId) -> Result<Self, CoreError> {
        let bytes = id.as_str().as_bytes();
        if bytes.len() > MEMO_BYTES {
            return Err(CoreError::InvalidMemo(format!(
                "invoice id {} exceeds {} bytes",
                id, MEMO_BYTES
            )));
        }
        let mut buf = [0u8; MEMO_BYTES];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(format!("0x{}", hex::encode(buf))))
    }

    /// Parse a memo observed on the ledger, normalizing the hex casing.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let hex_part = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidMemo(format!("missing 0x prefix: {}", raw)))?;
        let bytes = hex::decode(hex_part)
            .map_err(|e| CoreError::InvalidMemo(format!("bad hex: {}", e)))?;
        if bytes.len() != MEMO_BYTES {
            return Err(CoreError::InvalidMemo(format!(
                "expected {} bytes, got {}",
                MEMO_BYTES,
                bytes.len()
            )));
        }
        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    /// Get the memo as a string slice (`0x` + 64 lowercase hex chars).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte ledger account address, normalized to lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse and validate an address (`0x` + 40 hex chars).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let hex_part = raw.strip_prefix("0x").unwrap_or("");
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(format!(
                "expected a 20-byte hex address, got {:?}",
                raw
            )));
        }
        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    /// Get the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 32-byte signing key (`0x` + 64 hex chars).
///
/// Memopay never performs cryptography itself; the key is an opaque
/// credential handed to the ledger client. Validated at startup so a
/// misconfigured payer fails fast instead of at first submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Parse and validate a private key.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let hex_part = raw.strip_prefix("0x").unwrap_or("");
        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidKey(
                "expected a 32-byte private key (0x + 64 hex chars)".into(),
            ));
        }
        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque transaction reference assigned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(String);

impl TxRef {
    /// Wrap a raw transaction reference.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle status of an invoice.
///
/// The only transition is Pending → Paid, applied exactly once by the
/// invoice ledger. Paid is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Awaiting a matching transfer on the ledger.
    Pending,
    /// Settled by exactly one matching transfer. Final state.
    Paid,
}

impl InvoiceStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// A request for a specific exact-amount payment, correlated on-ledger
/// via its memo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Process-unique identifier, immutable.
    pub id: InvoiceId,
    /// Correlation key, deterministically derived from `id`, immutable.
    pub memo: Memo,
    /// Free-form note attached at creation.
    pub note: String,
    /// Receiving account of the merchant.
    pub merchant_address: Address,
    /// Human-readable amount (e.g. "10.5").
    pub amount: String,
    /// Exact amount in the token's smallest unit, immutable.
    pub amount_units: u128,
    /// Settlement status. Mutated only by the invoice ledger.
    pub status: InvoiceStatus,
    /// Creation time, used for display ordering only.
    pub created_at: DateTime<Utc>,
    /// Set on transition to paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Transaction that settled the invoice, set on transition to paid.
    pub tx_ref: Option<TxRef>,
    /// Account that paid, set on transition to paid.
    pub payer: Option<Address>,
}
