//! Token identity and exact-amount arithmetic.
//!
//! All settlement amounts are integer counts of the token's smallest
//! unit; decimal strings exist only at the edges (user input, display).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Address;

/// Identity of the token invoices are denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token contract address.
    pub address: Address,
    /// Display symbol (e.g. "AlphaUSD").
    pub symbol: String,
    /// Number of decimal places of the smallest unit.
    pub decimals: u32,
}

impl TokenConfig {
    /// Parse a decimal amount string into smallest units.
    pub fn parse_amount(&self, text: &str) -> Result<u128, CoreError> {
        parse_units(text, self.decimals)
    }

    /// Format a smallest-unit amount as a decimal string.
    pub fn format_units(&self, value: u128) -> String {
        format_units(value, self.decimals)
    }
}

/// Parse a decimal string into an exact integer count of smallest units.
///
/// Rejects empty, non-numeric, zero, and over-precise input (more
/// fractional digits than `decimals`). Signs are not accepted: amounts
/// are unsigned by construction.
pub fn parse_units(text: &str, decimals: u32) -> Result<u128, CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidAmount("amount is required".into()));
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(CoreError::InvalidAmount(format!("not a number: {:?}", text)));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(CoreError::InvalidAmount(format!("not a number: {:?}", text)));
    }
    if frac_part.len() as u32 > decimals {
        return Err(CoreError::InvalidAmount(format!(
            "more than {} decimal places: {:?}",
            decimals, text
        )));
    }

    let scale = 10u128
        .checked_pow(decimals)
        .ok_or_else(|| CoreError::InvalidAmount(format!("decimals out of range: {}", decimals)))?;

    let int_value: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| CoreError::InvalidAmount(format!("amount out of range: {:?}", text)))?
    };

    let frac_value: u128 = if frac_part.is_empty() {
        0
    } else {
        let padding = decimals as usize - frac_part.len();
        let padded = format!("{}{}", frac_part, "0".repeat(padding));
        padded
            .parse()
            .map_err(|_| CoreError::InvalidAmount(format!("amount out of range: {:?}", text)))?
    };

    let units = int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| CoreError::InvalidAmount(format!("amount out of range: {:?}", text)))?;

    if units == 0 {
        return Err(CoreError::InvalidAmount("amount must be positive".into()));
    }
    Ok(units)
}

/// Format a smallest-unit amount as a decimal string, trimming trailing
/// fractional zeros.
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let scale = 10u128.pow(decimals);
    let int_part = value / scale;
    let frac_part = value % scale;
    if frac_part == 0 {
        return int_part.to_string();
    }
    let frac = format!("{:0width$}", frac_part, width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}
