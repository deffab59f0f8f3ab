//! Application configuration.
//!
//! Plain serde structs with defaults matching the public testnet, loaded
//! from TOML by the node binary. Addresses and keys are kept as raw
//! strings here and validated into typed values at startup; a malformed
//! value aborts startup with a descriptive error.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::token::TokenConfig;
use crate::types::{Address, PrivateKey, TxRef};

/// Ledger endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// RPC endpoint of the ledger.
    pub rpc_url: String,
    /// Chain identifier.
    pub chain_id: u64,
    /// Block explorer base URL, used for transaction links.
    pub explorer_url: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.moderato.tempo.xyz".into(),
            chain_id: 42431,
            explorer_url: "https://explore.tempo.xyz".into(),
        }
    }
}

/// Token identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSection {
    /// Token contract address.
    pub address: String,
    /// Display symbol.
    pub symbol: String,
    /// Decimal places of the smallest unit.
    pub decimals: u32,
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            address: "0x20c0000000000000000000000000000000000001".into(),
            symbol: "AlphaUSD".into(),
            decimals: 6,
        }
    }
}

/// Merchant-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantSection {
    /// Receiving account of the merchant.
    pub address: String,
    /// Watcher poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Watcher startup lookback window, in ledger positions.
    pub lookback: u64,
}

impl Default for MerchantSection {
    fn default() -> Self {
        Self {
            address: String::new(),
            poll_interval_ms: 1500,
            lookback: 64,
        }
    }
}

/// Payer-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayerSection {
    /// Account the payer spends from.
    pub address: String,
    /// Signing key handed to the ledger client.
    pub private_key: String,
    /// Whether incoming invoices are honored without manual approval.
    pub auto_accept: bool,
    /// Starting balance credited on the dev chain (decimal string).
    pub dev_balance: String,
}

impl Default for PayerSection {
    fn default() -> Self {
        Self {
            address: String::new(),
            private_key: String::new(),
            auto_accept: true,
            dev_balance: "100".into(),
        }
    }
}

/// Top-level configuration for a memopay process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub token: TokenSection,
    pub merchant: MerchantSection,
    pub payer: PayerSection,
}

impl AppConfig {
    /// A configuration with well-known dev-chain accounts filled in,
    /// used by the demo binary when no config file is given and by
    /// tests.
    pub fn dev() -> Self {
        let mut config = Self::default();
        config.merchant.address = "0xaaaa000000000000000000000000000000000001".into();
        config.payer.address = "0xbbbb000000000000000000000000000000000002".into();
        config.payer.private_key = format!("0x{}", "11".repeat(32));
        config
    }

    /// Validate every typed field, aborting startup on the first error.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.token_config()?;
        self.merchant_address()?;
        self.payer_address()?;
        self.payer_key()?;
        if self.merchant.poll_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "merchant.poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Typed token identity.
    pub fn token_config(&self) -> Result<TokenConfig, CoreError> {
        Ok(TokenConfig {
            address: Address::parse(&self.token.address)?,
            symbol: self.token.symbol.clone(),
            decimals: self.token.decimals,
        })
    }

    /// Validated merchant receiving address.
    pub fn merchant_address(&self) -> Result<Address, CoreError> {
        Address::parse(&self.merchant.address)
            .map_err(|_| CoreError::InvalidConfig("merchant.address is not a valid address".into()))
    }

    /// Validated payer account address.
    pub fn payer_address(&self) -> Result<Address, CoreError> {
        Address::parse(&self.payer.address)
            .map_err(|_| CoreError::InvalidConfig("payer.address is not a valid address".into()))
    }

    /// Validated payer signing key.
    pub fn payer_key(&self) -> Result<PrivateKey, CoreError> {
        PrivateKey::parse(&self.payer.private_key)
            .map_err(|_| CoreError::InvalidConfig("payer.private_key is not a valid key".into()))
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, tx_ref: &TxRef) -> String {
        format!(
            "{}/tx/{}",
            self.chain.explorer_url.trim_end_matches('/'),
            tx_ref
        )
    }
}
