//! Shared helpers for the memopay integration tests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use memopay_chain::DevChain;
use memopay_core::{Address, TokenConfig};
use memopay_merchant::InvoiceLedger;

/// A 20-byte address padded out from a short suffix.
pub fn addr(suffix: &str) -> Address {
    Address::parse(&format!("0x{:0>40}", suffix)).unwrap()
}

/// The dev token used across the integration tests (6 decimals).
pub fn token() -> TokenConfig {
    TokenConfig {
        address: addr("feed"),
        symbol: "AlphaUSD".into(),
        decimals: 6,
    }
}

/// A dev chain, invoice ledger, merchant account and payer account,
/// with the payer funded with `payer_balance` (decimal token units).
pub fn stack(payer_balance: &str) -> (Arc<DevChain>, Arc<InvoiceLedger>, Address, Address) {
    let chain = Arc::new(DevChain::new());
    let merchant = addr("a1");
    let payer = addr("b2");
    chain.credit(&payer, token().parse_amount(payer_balance).unwrap());
    let ledger = Arc::new(InvoiceLedger::new(token(), merchant.clone()));
    (chain, ledger, merchant, payer)
}

/// Poll `condition` until it holds or `timeout` elapses; panics on
/// timeout.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            timeout
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
