// src/blockchain/nonce_manager.rs

use anyhow::{anyhow, Result};
use ethers_core::types::{Address, U256};
use tokio::sync::Mutex;

/// Serializes nonce allocation for the configured signing identity so that
/// concurrently submitted transactions never collide on a sequence number.
#[derive(Debug, Default)]
pub struct NonceManager {
    next_nonce: Mutex<Option<U256>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self {
            next_nonce: Mutex::new(None),
        }
    }

    /// Returns the next nonce for `address`, fetching the current count from
    /// the node on first use and incrementing locally afterwards. The lock is
    /// held across the read-assign-increment so concurrent submissions see
    /// sequential nonces.
    pub async fn next(
        &self,
        client: &reqwest::Client,
        rpc_url: &str,
        address: Address,
    ) -> Result<U256> {
        let mut state = self.next_nonce.lock().await;

        let nonce = match *state {
            Some(nonce) => nonce,
            None => {
                let payload = serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "eth_getTransactionCount",
                    "params": [format!("{address:?}"), "latest"],
                    "id": 1
                });
                let resp: serde_json::Value = client
                    .post(rpc_url)
                    .json(&payload)
                    .send()
                    .await?
                    .json()
                    .await?;
                let nonce_hex = resp["result"]
                    .as_str()
                    .ok_or_else(|| anyhow!("missing nonce in RPC response"))?;
                U256::from_str_radix(nonce_hex.trim_start_matches("0x"), 16)?
            }
        };

        *state = Some(nonce + U256::one());
        Ok(nonce)
    }

    /// Drops the cached sequence so the next allocation re-fetches the
    /// current count from the node. Used when a submission fails after its
    /// nonce was allocated; the chain never consumed it, and continuing the
    /// local sequence would leave a gap no later transaction can fill.
    pub async fn invalidate(&self) {
        *self.next_nonce.lock().await = None;
    }
}
