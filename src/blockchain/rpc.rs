// src/blockchain/rpc.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::nonce_manager::NonceManager;

/// A fully encoded call: destination, payload and optional attached value.
/// Derived deterministically from one registry signature; consumed once.
#[derive(Debug, Clone)]
pub struct EncodedCall {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
}

/// Inclusion status the chain reports for a submitted transaction.
#[derive(Debug, Clone)]
pub struct ReceiptStatus {
    pub success: bool,
    /// Revert reason, when the node includes one in the receipt.
    pub revert_reason: Option<String>,
}

/// The chain boundary consumed by the dispatcher. Implementations may fail,
/// time out, or report well-formed-but-unsuccessful results (revert); the
/// dispatcher classifies those, it never retries them.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Sign and submit a state-changing transaction, returning its hash.
    async fn submit_transaction(&self, call: &EncodedCall) -> Result<H256>;

    /// Execute the payload as a call-without-state-change and return the raw
    /// return bytes.
    async fn call_readonly(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Inclusion status for a submitted transaction; `None` while pending.
    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<ReceiptStatus>>;
}

/// JSON-RPC implementation over HTTP, signing locally with the configured
/// identity. Gas limit and price are estimated per transaction unless fixed
/// settings are supplied.
pub struct HttpRpc {
    rpc_url: String,
    client: Client,
    wallet: LocalWallet,
    nonce_manager: NonceManager,
    gas_limit: Option<u64>,
    gas_price: Option<u64>,
}

impl HttpRpc {
    pub fn new(rpc_url: impl Into<String>, wallet: LocalWallet) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            client: Client::new(),
            wallet,
            nonce_manager: NonceManager::new(),
            gas_limit: None,
            gas_price: None,
        }
    }

    /// Fixed gas settings; anything left `None` is fetched from the node per
    /// transaction.
    pub fn with_gas(mut self, gas_limit: Option<u64>, gas_price: Option<u64>) -> Self {
        self.gas_limit = gas_limit;
        self.gas_price = gas_price;
        self
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let resp: Value = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json()
            .await
            .with_context(|| format!("{method} returned malformed JSON"))?;
        if let Some(err) = resp.get("error") {
            return Err(anyhow!("RPC error from {method}: {err}"));
        }
        Ok(resp["result"].clone())
    }

    fn parse_quantity(value: &Value, what: &str) -> Result<U256> {
        let hex_str = value
            .as_str()
            .ok_or_else(|| anyhow!("missing {what} in RPC response"))?;
        Ok(U256::from_str_radix(hex_str.trim_start_matches("0x"), 16)?)
    }

    async fn submit_with_nonce(
        &self,
        call: &EncodedCall,
        from: Address,
        nonce: U256,
    ) -> Result<H256> {
        let chain_id =
            Self::parse_quantity(&self.rpc("eth_chainId", json!([])).await?, "chain id")?;

        let mut tx = TransactionRequest::new()
            .from(from)
            .to(call.to)
            .data(call.data.clone())
            .nonce(nonce)
            .chain_id(chain_id.as_u64());
        if let Some(value) = call.value {
            tx = tx.value(value);
        }

        let gas = match self.gas_limit {
            Some(limit) => U256::from(limit),
            None => {
                let call_obj = serde_json::to_value(&tx)?;
                Self::parse_quantity(
                    &self.rpc("eth_estimateGas", json!([call_obj])).await?,
                    "gas estimate",
                )?
            }
        };
        let gas_price = match self.gas_price {
            Some(price) => U256::from(price),
            None => {
                Self::parse_quantity(&self.rpc("eth_gasPrice", json!([])).await?, "gas price")?
            }
        };
        let tx = tx.gas(gas).gas_price(gas_price);

        let signature = self.wallet.sign_transaction(&tx.clone().into()).await?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = self
            .rpc(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw_tx))]),
            )
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| anyhow!("missing transaction hash in RPC response"))?;
        debug!(tx_hash, "transaction submitted");
        Ok(tx_hash.parse()?)
    }
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn submit_transaction(&self, call: &EncodedCall) -> Result<H256> {
        let from = self.wallet.address();
        let nonce = self
            .nonce_manager
            .next(&self.client, &self.rpc_url, from)
            .await?;

        match self.submit_with_nonce(call, from, nonce).await {
            Ok(tx_hash) => Ok(tx_hash),
            Err(e) => {
                // The chain never consumed the allocated nonce. Drop the
                // cached sequence so the next submission re-syncs with the
                // node instead of leaving an unfillable gap.
                self.nonce_manager.invalidate().await;
                Err(e)
            }
        }
    }

    async fn call_readonly(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let params = json!([
            {"to": format!("{to:?}"), "data": format!("0x{}", hex::encode(&data))},
            "latest"
        ]);
        let result = self.rpc("eth_call", params).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| anyhow!("eth_call result is not a string"))?;
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))?;
        Ok(Bytes::from(bytes))
    }

    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<ReceiptStatus>> {
        let result = self
            .rpc("eth_getTransactionReceipt", json!([format!("{tx_hash:?}")]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        // Post-Byzantium receipts carry "0x1"/"0x0". A receipt without a
        // usable status field leaves inclusion unresolved; erroring here lets
        // the poll loop retry rather than misreporting a revert.
        let success = match result["status"].as_str() {
            Some("0x1") => true,
            Some("0x0") => false,
            _ => {
                return Err(anyhow!(
                    "transaction receipt for {tx_hash:?} is missing a status field"
                ))
            }
        };
        let revert_reason = result
            .get("revertReason")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(Some(ReceiptStatus {
            success,
            revert_reason,
        }))
    }
}
